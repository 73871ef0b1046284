//! Canonical channel identifiers.
//!
//! A conversation between a student and a coach maps to exactly one channel.
//! The two participant ids are arbitrary-length unique identifiers, but the
//! transport caps channel ids at 64 characters, so the id is derived from a
//! fixed-length prefix of each: `coaching-{student_id[..8]}-{coach_id[..8]}`.
//! For a fixed pair this is deterministic and independent of which side
//! resolves the channel first.

use crate::error::StreamError;
use coachchat_common::models::{ChatUser, UserRole};

/// Maximum channel id length accepted by the transport.
pub const CHANNEL_ID_MAX_LEN: usize = 64;

const CHANNEL_ID_PREFIX: &str = "coaching";

/// Number of leading characters taken from each participant id.
const ID_PREFIX_CHARS: usize = 8;

/// Derive the canonical channel id for a (student, coach) pair.
///
/// Ids shorter than the prefix length are used whole.
pub fn canonical_channel_id(student_id: &str, coach_id: &str) -> String {
    let short_student: String = student_id.chars().take(ID_PREFIX_CHARS).collect();
    let short_coach: String = coach_id.chars().take(ID_PREFIX_CHARS).collect();
    format!("{}-{}-{}", CHANNEL_ID_PREFIX, short_student, short_coach)
}

/// A resolved (student, coach) pair.
///
/// Role assignment happens here, so callers can pass `(user, partner)` from
/// either side of the conversation and still land on the same channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelPair {
    pub student_id: String,
    pub coach_id: String,
}

impl ChannelPair {
    /// Build the pair from the local user and their assigned partner.
    ///
    /// # Errors
    ///
    /// Fails if both participants have the same role — a coaching channel
    /// always joins exactly one student with exactly one coach.
    pub fn from_participants(user: &ChatUser, partner: &ChatUser) -> Result<Self, StreamError> {
        match (user.role, partner.role) {
            (UserRole::Student, UserRole::Coach) => Ok(Self {
                student_id: user.id.clone(),
                coach_id: partner.id.clone(),
            }),
            (UserRole::Coach, UserRole::Student) => Ok(Self {
                student_id: partner.id.clone(),
                coach_id: user.id.clone(),
            }),
            (role, _) => Err(StreamError::Channel(format!(
                "cannot pair two users with role {}",
                role
            ))),
        }
    }

    /// The canonical channel id for this pair.
    pub fn channel_id(&self) -> String {
        canonical_channel_id(&self.student_id, &self.coach_id)
    }

    /// Both member ids, student first.
    pub fn members(&self) -> [String; 2] {
        [self.student_id.clone(), self.coach_id.clone()]
    }
}
