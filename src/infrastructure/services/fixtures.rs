//! Synthetic episodes shared by the service tests

use ndarray::Array1;

use crate::domain::features::derive_all;
use crate::domain::frame::FeatureFrame;
use crate::domain::model::{BayesianRidge, BayesianRidgeConfig, TrainedModel};
use crate::domain::record::{LabeledRecord, PublicationDay, PublicationTime, RawRecord};
use crate::domain::transform::FittedTransform;

const SHOWS: [(&str, &str, f64); 4] = [
    ("Tech Talks", "Technology", 5.0),
    ("Joke Junction", "Comedy", -3.0),
    ("Mystery Matters", "True Crime", 8.0),
    ("Daily Digest", "News", -6.0),
];

pub fn raw_record(i: usize) -> RawRecord {
    let (name, genre, _) = SHOWS[i % SHOWS.len()];
    RawRecord::builder()
        .podcast_name(name)
        .episode_length_minutes(20.0 + ((i * 7) % 60) as f64)
        .genre(genre)
        .publication_day(PublicationDay::ALL[i % 7].as_str())
        .publication_time(PublicationTime::ALL[(i / 3) % 4].as_str())
        .build()
        .unwrap()
}

pub fn labeled_records(n: usize) -> Vec<LabeledRecord> {
    (0..n)
        .map(|i| {
            let record = raw_record(i);
            let offset = SHOWS[i % SHOWS.len()].2;
            let minutes = 0.6 * record.episode_length_minutes.unwrap() + offset + (i % 3) as f64;
            LabeledRecord::new(record, minutes).unwrap()
        })
        .collect()
}

/// Transform and model fitted on `labeled_records(n)`
pub fn fitted_pipeline(n: usize) -> (FittedTransform, TrainedModel) {
    let records = labeled_records(n);
    let raw: Vec<RawRecord> = records.iter().map(|r| r.record.clone()).collect();
    let target: Vec<f64> = records.iter().map(|r| r.listening_time_minutes).collect();

    let frame = FeatureFrame::from_engineered(&derive_all(&raw));
    let transform = FittedTransform::fit(&frame, &target).unwrap();
    let x = transform.transform(&frame).unwrap();
    let model =
        BayesianRidge::fit(&BayesianRidgeConfig::default(), x.view(), Array1::from(target).view())
            .unwrap();

    (transform, TrainedModel::BayesianRidge(model))
}
