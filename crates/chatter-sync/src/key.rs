use std::fmt;

use uuid::Uuid;

/// Composite cache key: ordered segments identifying a resource plus
/// its parameters. Invalidation and cancellation match by prefix, so
/// `posts/detail` covers every `posts/detail/<id>` entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn root(segment: impl Into<String>) -> Self {
        Self(vec![segment.into()])
    }

    pub fn child(mut self, segment: impl Into<String>) -> Self {
        self.0.push(segment.into());
        self
    }

    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.len() >= prefix.0.len() && self.0[..prefix.0.len()] == prefix.0[..]
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

pub mod auth_keys {
    use super::QueryKey;

    pub fn all() -> QueryKey {
        QueryKey::root("auth")
    }

    pub fn current_user() -> QueryKey {
        all().child("currentUser")
    }
}

pub mod post_keys {
    use super::*;
    use chatter_types::api::ListPostsParams;

    pub fn all() -> QueryKey {
        QueryKey::root("posts")
    }

    pub fn lists() -> QueryKey {
        all().child("list")
    }

    pub fn list(params: &ListPostsParams) -> QueryKey {
        // Params become one opaque segment so distinct filters get
        // distinct entries while `lists()` still covers them all.
        lists().child(serde_json::to_string(params).unwrap_or_default())
    }

    /// One user's posts as an infinite list; covered by `lists()` for
    /// invalidation.
    pub fn user(user_id: Uuid) -> QueryKey {
        lists().child("user").child(user_id.to_string())
    }

    pub fn feed() -> QueryKey {
        all().child("feed")
    }

    pub fn details() -> QueryKey {
        all().child("detail")
    }

    pub fn detail(id: Uuid) -> QueryKey {
        details().child(id.to_string())
    }
}

pub mod comment_keys {
    use super::*;

    pub fn all() -> QueryKey {
        QueryKey::root("comments")
    }

    pub fn lists() -> QueryKey {
        all().child("list")
    }

    pub fn list(post_id: Uuid) -> QueryKey {
        lists().child(post_id.to_string())
    }

    pub fn details() -> QueryKey {
        all().child("detail")
    }

    pub fn detail(id: Uuid) -> QueryKey {
        details().child(id.to_string())
    }
}

pub mod like_keys {
    use super::*;

    pub fn all() -> QueryKey {
        QueryKey::root("likes")
    }

    pub fn count(post_id: Uuid) -> QueryKey {
        all().child("count").child(post_id.to_string())
    }

    pub fn status(post_id: Uuid) -> QueryKey {
        all().child("status").child(post_id.to_string())
    }
}

pub mod follow_keys {
    use super::*;

    pub fn all() -> QueryKey {
        QueryKey::root("follows")
    }

    pub fn followers(user_id: Uuid) -> QueryKey {
        all().child("followers").child(user_id.to_string())
    }

    pub fn following_all() -> QueryKey {
        all().child("following")
    }

    pub fn following(user_id: Uuid) -> QueryKey {
        following_all().child(user_id.to_string())
    }

    pub fn stats(user_id: Uuid) -> QueryKey {
        all().child("stats").child(user_id.to_string())
    }

    pub fn is_following(user_id: Uuid) -> QueryKey {
        all().child("isFollowing").child(user_id.to_string())
    }
}

pub mod chat_keys {
    use super::*;

    pub fn all() -> QueryKey {
        QueryKey::root("chat")
    }

    pub fn conversations() -> QueryKey {
        all().child("conversations")
    }

    pub fn conversation(id: Uuid) -> QueryKey {
        all().child("conversation").child(id.to_string())
    }

    pub fn messages(conversation_id: Uuid) -> QueryKey {
        all().child("messages").child(conversation_id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_matching() {
        let id = Uuid::new_v4();
        let detail = post_keys::detail(id);
        assert!(detail.starts_with(&post_keys::all()));
        assert!(detail.starts_with(&post_keys::details()));
        assert!(detail.starts_with(&detail));
        assert!(!detail.starts_with(&post_keys::feed()));
        assert!(!post_keys::details().starts_with(&detail));
    }

    #[test]
    fn distinct_params_get_distinct_keys() {
        use chatter_types::api::ListPostsParams;
        let a = post_keys::list(&ListPostsParams {
            page: Some(1),
            ..Default::default()
        });
        let b = post_keys::list(&ListPostsParams {
            page: Some(2),
            ..Default::default()
        });
        assert_ne!(a, b);
        assert!(a.starts_with(&post_keys::lists()));
        assert!(b.starts_with(&post_keys::lists()));
    }
}
