use common::models::StrikeRecord;

/// Picks the `count` strikes closest to `reference_price`, returned in ascending strike order.
pub fn select_neighborhood(
    records: &[StrikeRecord],
    reference_price: f64,
    count: usize,
) -> Vec<StrikeRecord> {
    let distance = |record: &StrikeRecord| (record.strike as f64 - reference_price).abs();

    let mut by_distance: Vec<&StrikeRecord> = records.iter().collect();
    // stable sorts: equal distances keep ascending-strike order
    by_distance.sort_by_key(|record| record.strike);
    by_distance.sort_by(|a, b| distance(a).total_cmp(&distance(b)));

    let mut selected: Vec<StrikeRecord> = by_distance.into_iter().take(count).copied().collect();
    selected.sort_by_key(|record| record.strike);
    selected
}
