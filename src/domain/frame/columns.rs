//! Canonical column names shared by the dataset, request log and model stages

pub const PODCAST_NAME: &str = "Podcast_Name";
pub const EPISODE_LENGTH: &str = "Episode_Length_minutes";
pub const GENRE: &str = "Genre";
pub const PUBLICATION_DAY: &str = "Publication_Day";
pub const PUBLICATION_TIME: &str = "Publication_Time";
pub const PUB_DAY_TIME: &str = "Pub_Day_Time";
pub const LISTENING_TIME: &str = "Listening_Time_minutes";

/// Name of the prediction column in the live request log
pub const PREDICTION: &str = "prediction";
