use crate::config::DatasetConfig;
use crate::models::Review;
use anyhow::{Context, Result, bail};
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use std::io::Read;
use tracing::{debug, info, warn};

/// Number of distinct star ratings
pub const RATING_CLASSES: usize = 5;

/// Load the configured CSV and draw a balanced sample from it
pub fn load_sample(config: &DatasetConfig, sample_size: usize) -> Result<Vec<Review>> {
    let file = std::fs::File::open(&config.path)
        .with_context(|| format!("Failed to open dataset: {}", config.path.display()))?;

    let reviews = read_reviews(file, &config.text_column, &config.stars_column)
        .with_context(|| format!("Failed to read dataset: {}", config.path.display()))?;
    info!(path = %config.path.display(), rows = reviews.len(), "loaded dataset");

    let sample = balanced_sample(&reviews, sample_size, config.seed)?;
    info!(
        sampled = sample.len(),
        distribution = ?rating_distribution(&sample),
        "sampled reviews"
    );

    Ok(sample)
}

/// Read reviews from CSV, skipping rows whose rating is not 1..=5
pub fn read_reviews<R: Read>(reader: R, text_column: &str, stars_column: &str) -> Result<Vec<Review>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let headers = csv_reader.headers().context("Failed to read CSV header")?.clone();

    let text_idx = column_index(&headers, text_column)?;
    let stars_idx = column_index(&headers, stars_column)?;

    let mut reviews = Vec::new();
    let mut skipped = 0usize;

    for (row, record) in csv_reader.records().enumerate() {
        let record = record.with_context(|| format!("Malformed CSV row {}", row + 1))?;

        let stars = record
            .get(stars_idx)
            .and_then(|s| s.trim().parse::<u8>().ok())
            .filter(|s| (1..=5).contains(s));

        match (stars, record.get(text_idx)) {
            (Some(stars), Some(text)) => reviews.push(Review {
                text: text.to_string(),
                stars,
            }),
            _ => {
                debug!(row = row + 1, "skipping row without a 1-5 rating");
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        warn!(skipped, "skipped rows without a usable rating");
    }

    Ok(reviews)
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .with_context(|| format!("Column '{}' not found in CSV header", name))
}

/// Take `sample_size / 5` reviews of each rating, then shuffle them together.
///
/// The same seed over the same input always yields the same sample.
pub fn balanced_sample(reviews: &[Review], sample_size: usize, seed: u64) -> Result<Vec<Review>> {
    let per_rating = sample_size / RATING_CLASSES;
    if per_rating == 0 {
        bail!(
            "Sample size {} is too small; need at least {} for one review per rating",
            sample_size,
            RATING_CLASSES
        );
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut sample = Vec::with_capacity(per_rating * RATING_CLASSES);

    for stars in 1..=RATING_CLASSES as u8 {
        let pool: Vec<&Review> = reviews.iter().filter(|r| r.stars == stars).collect();
        if pool.len() < per_rating {
            bail!(
                "Not enough {}-star reviews: need {}, found {}",
                stars,
                per_rating,
                pool.len()
            );
        }
        sample.extend(pool.choose_multiple(&mut rng, per_rating).map(|r| (*r).clone()));
    }

    sample.shuffle(&mut rng);
    Ok(sample)
}

/// Count of reviews per rating, index 0 being one star
pub fn rating_distribution(reviews: &[Review]) -> [usize; RATING_CLASSES] {
    let mut counts = [0usize; RATING_CLASSES];
    for review in reviews {
        if (1..=RATING_CLASSES as u8).contains(&review.stars) {
            counts[usize::from(review.stars - 1)] += 1;
        }
    }
    counts
}
