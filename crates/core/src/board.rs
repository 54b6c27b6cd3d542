use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::ids::{BoardId, TeamId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BoardType {
    #[default]
    #[serde(rename = "O")]
    Open,
    #[serde(rename = "P")]
    Private,
}

impl BoardType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "O",
            Self::Private => "P",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "O" => Ok(Self::Open),
            "P" => Ok(Self::Private),
            _ => Err(CoreError::InvalidData(format!("unknown board type: {s}"))),
        }
    }
}

/// The partition that owns blocks. Only the parts the block store needs to
/// hand back to the authorization layer are modeled here.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub id: BoardId,
    pub team_id: TeamId,
    #[serde(rename = "type")]
    pub board_type: BoardType,
    pub title: String,
    pub is_template: bool,
    pub created_by: UserId,
    pub create_at: i64,
    pub update_at: i64,
    pub delete_at: i64,
}
