//! Raw and labeled episode records

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::validation::{
    validate_episode_length, validate_label, validate_listening_time, RecordValidationError,
};

/// Day of the week an episode was published
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PublicationDay {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl PublicationDay {
    pub const ALL: [PublicationDay; 7] = [
        Self::Monday,
        Self::Tuesday,
        Self::Wednesday,
        Self::Thursday,
        Self::Friday,
        Self::Saturday,
        Self::Sunday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monday => "Monday",
            Self::Tuesday => "Tuesday",
            Self::Wednesday => "Wednesday",
            Self::Thursday => "Thursday",
            Self::Friday => "Friday",
            Self::Saturday => "Saturday",
            Self::Sunday => "Sunday",
        }
    }
}

impl FromStr for PublicationDay {
    type Err = RecordValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|day| day.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| RecordValidationError::UnknownPublicationDay(s.to_string()))
    }
}

impl TryFrom<String> for PublicationDay {
    type Error = RecordValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PublicationDay> for String {
    fn from(day: PublicationDay) -> Self {
        day.as_str().to_string()
    }
}

impl fmt::Display for PublicationDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Time-of-day bucket an episode was published in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PublicationTime {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl PublicationTime {
    pub const ALL: [PublicationTime; 4] =
        [Self::Morning, Self::Afternoon, Self::Evening, Self::Night];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Morning => "Morning",
            Self::Afternoon => "Afternoon",
            Self::Evening => "Evening",
            Self::Night => "Night",
        }
    }
}

impl FromStr for PublicationTime {
    type Err = RecordValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|time| time.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| RecordValidationError::UnknownPublicationTime(s.to_string()))
    }
}

impl TryFrom<String> for PublicationTime {
    type Error = RecordValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PublicationTime> for String {
    fn from(time: PublicationTime) -> Self {
        time.as_str().to_string()
    }
}

impl fmt::Display for PublicationTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One episode as submitted by a user or read from the raw dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub podcast_name: String,
    pub episode_length_minutes: Option<f64>,
    pub genre: String,
    pub publication_day: PublicationDay,
    pub publication_time: PublicationTime,
}

impl RawRecord {
    /// Start building a record
    pub fn builder() -> RawRecordBuilder {
        RawRecordBuilder::default()
    }
}

/// Builder validating every required field of a [`RawRecord`]
#[derive(Debug, Clone, Default)]
pub struct RawRecordBuilder {
    podcast_name: Option<String>,
    episode_length_minutes: Option<f64>,
    genre: Option<String>,
    publication_day: Option<String>,
    publication_time: Option<String>,
}

impl RawRecordBuilder {
    pub fn podcast_name(mut self, name: impl Into<String>) -> Self {
        self.podcast_name = Some(name.into());
        self
    }

    pub fn episode_length_minutes(mut self, minutes: f64) -> Self {
        self.episode_length_minutes = Some(minutes);
        self
    }

    /// Set an episode length that may be missing (training data only)
    pub fn maybe_episode_length_minutes(mut self, minutes: Option<f64>) -> Self {
        self.episode_length_minutes = minutes;
        self
    }

    pub fn genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    pub fn publication_day(mut self, day: impl Into<String>) -> Self {
        self.publication_day = Some(day.into());
        self
    }

    pub fn publication_time(mut self, time: impl Into<String>) -> Self {
        self.publication_time = Some(time.into());
        self
    }

    pub fn build(self) -> Result<RawRecord, RecordValidationError> {
        let podcast_name = self
            .podcast_name
            .ok_or(RecordValidationError::MissingField("Podcast_Name"))?;
        validate_label("Podcast_Name", &podcast_name)?;

        let genre = self.genre.ok_or(RecordValidationError::MissingField("Genre"))?;
        validate_label("Genre", &genre)?;

        validate_episode_length(self.episode_length_minutes)?;

        let publication_day = self
            .publication_day
            .ok_or(RecordValidationError::MissingField("Publication_Day"))?
            .parse()?;
        let publication_time = self
            .publication_time
            .ok_or(RecordValidationError::MissingField("Publication_Time"))?
            .parse()?;

        Ok(RawRecord {
            podcast_name,
            episode_length_minutes: self.episode_length_minutes,
            genre,
            publication_day,
            publication_time,
        })
    }
}

/// A raw record paired with its observed listening time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledRecord {
    pub record: RawRecord,
    pub listening_time_minutes: f64,
}

impl LabeledRecord {
    pub fn new(record: RawRecord, listening_time_minutes: f64) -> Result<Self, RecordValidationError> {
        validate_listening_time(listening_time_minutes)?;
        Ok(Self {
            record,
            listening_time_minutes,
        })
    }
}

/// Record after feature derivation: day and time merged into one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineeredRecord {
    pub podcast_name: String,
    pub episode_length_minutes: Option<f64>,
    pub genre: String,
    pub pub_day_time: String,
}
