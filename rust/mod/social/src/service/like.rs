use tracing::info;

use crate::model::User;
use crate::service::{Direction, Relation, SocialError, SocialService, Toggle};

pub(crate) fn tweet_not_found(id: i64) -> SocialError {
    SocialError::NotFound(format!("Твит с id# {} не найден", id))
}

impl SocialService {
    /// `acting` likes tweet `tweet_id`. Authors cannot like their own tweets.
    pub fn like_tweet(&self, acting: &User, tweet_id: i64) -> Result<(), SocialError> {
        match self.toggle(acting.id, tweet_id, Relation::Like, Direction::Add)? {
            Toggle::Applied { owner_id } => {
                info!(user = acting.id, tweet = tweet_id, author = owner_id, "like");
                Ok(())
            }
            Toggle::Missing => Err(tweet_not_found(tweet_id)),
            Toggle::SelfTarget => Err(SocialError::InvalidOperation(
                "Нельзя поставить лайк самому себе!".to_string(),
            )),
            Toggle::Unchanged => Err(SocialError::InvalidOperation(format!(
                "Вы уже лайкнули твит с id# {}",
                tweet_id
            ))),
        }
    }

    /// `acting` removes its like from `tweet_id`.
    pub fn unlike_tweet(&self, acting: &User, tweet_id: i64) -> Result<(), SocialError> {
        match self.toggle(acting.id, tweet_id, Relation::Like, Direction::Remove)? {
            Toggle::Applied { .. } => {
                info!(user = acting.id, tweet = tweet_id, "unlike");
                Ok(())
            }
            Toggle::Missing => Err(tweet_not_found(tweet_id)),
            Toggle::Unchanged | Toggle::SelfTarget => Err(SocialError::InvalidOperation(format!(
                "Вы ещё не лайкнули твит с id# {}!",
                tweet_id
            ))),
        }
    }
}
