use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

const LABEL_LIMIT: usize = 15;

pub fn stable_hash(key: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    hasher.finish()
}

/// Two pseudo-random values in `[-1, 1]` derived from `id`, identical on every call.
pub fn stable_pair(id: &str) -> (f32, f32) {
    let hash = stable_hash(id);

    let x = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}

pub fn short_label(label: &str) -> String {
    if label.chars().count() > LABEL_LIMIT {
        let head = label.chars().take(LABEL_LIMIT).collect::<String>();
        format!("{head}...")
    } else {
        label.to_owned()
    }
}
