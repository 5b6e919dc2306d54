use tracing::info;

use crate::model::User;
use crate::service::{Direction, Relation, SocialError, SocialService, Toggle};

fn user_not_found(id: i64) -> SocialError {
    SocialError::NotFound(format!("Пользователь с id# {} не найден", id))
}

impl SocialService {
    /// `acting` starts following `target_id`.
    pub fn follow_user(&self, acting: &User, target_id: i64) -> Result<(), SocialError> {
        if acting.id == target_id {
            return Err(SocialError::InvalidOperation(
                "Вы не можете подписаться на самого себя!".to_string(),
            ));
        }

        match self.toggle(acting.id, target_id, Relation::Follow, Direction::Add)? {
            Toggle::Applied { .. } => {
                info!(follower = acting.id, following = target_id, "follow");
                Ok(())
            }
            Toggle::Missing => Err(user_not_found(target_id)),
            Toggle::Unchanged | Toggle::SelfTarget => Err(SocialError::InvalidOperation(
                format!("Вы уже подписаны на пользователя с id# {}", target_id),
            )),
        }
    }

    /// `acting` stops following `target_id`.
    pub fn unfollow_user(&self, acting: &User, target_id: i64) -> Result<(), SocialError> {
        match self.toggle(acting.id, target_id, Relation::Follow, Direction::Remove)? {
            Toggle::Applied { .. } => {
                info!(follower = acting.id, following = target_id, "unfollow");
                Ok(())
            }
            Toggle::Missing => Err(user_not_found(target_id)),
            Toggle::Unchanged | Toggle::SelfTarget => Err(SocialError::InvalidOperation(
                format!("Вы не подписаны на пользователя с id# {}", target_id),
            )),
        }
    }
}
