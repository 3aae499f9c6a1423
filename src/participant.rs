use teloxide::types::{User, UserId};

/// A chat user as the games see them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub username: String,
    pub nickname: Option<String>,
    pub is_bot: bool,
}

impl Identity {
    pub fn new(user_id: UserId, username: impl Into<String>) -> Identity {
        Identity {
            user_id,
            username: username.into(),
            nickname: None,
            is_bot: false,
        }
    }

    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Identity {
        self.nickname = Some(nickname.into());
        self
    }

    pub fn bot(mut self) -> Identity {
        self.is_bot = true;
        self
    }

    pub fn display_name(&self) -> &str {
        self.nickname.as_deref().unwrap_or(&self.username)
    }

    pub fn is_same(&self, other: &Identity) -> bool {
        self.user_id == other.user_id
    }
}

impl From<&User> for Identity {
    fn from(user: &User) -> Identity {
        Identity {
            user_id: user.id,
            username: user
                .username
                .clone()
                .unwrap_or_else(|| user.first_name.clone()),
            nickname: Some(user.full_name()),
            is_bot: user.is_bot,
        }
    }
}

/// Turn order and display number of a seated player. The host is always 1.
#[derive(Eq, Hash, PartialEq, Ord, PartialOrd, Copy, Clone, Debug, derive_more::Display)]
pub struct PlayerId(pub u8);

impl PlayerId {
    pub const HOST: PlayerId = PlayerId(1);
}

#[derive(Clone, Debug)]
pub struct Participant {
    pub identity: Identity,
    pub player_id: PlayerId,
}

impl Participant {
    pub fn new(identity: Identity, player_id: PlayerId) -> Participant {
        Participant {
            identity,
            player_id,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.identity.user_id
    }

    pub fn name(&self) -> &str {
        self.identity.display_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nickname_falls_back_to_username() {
        let plain = Identity::new(UserId(1), "toast");
        assert_eq!(plain.display_name(), "toast");

        let named = plain.clone().with_nickname("Sir Toast");
        assert_eq!(named.display_name(), "Sir Toast");
        assert!(named.is_same(&plain));
    }
}
