use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use crate::point::PricePoint;

/// Date-ordered price history for one asset.
///
/// Every mutation builds the next array in full and swaps it in, so the
/// store is never observable half-sorted or with a duplicated date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesStore {
    points: Vec<PricePoint>,
}

impl SeriesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from rows in any order; later rows win on duplicate dates.
    pub fn from_points(points: impl IntoIterator<Item = PricePoint>) -> Self {
        let mut store = Self::new();
        store.upsert(points);
        store
    }

    /// Insert or replace by date, then re-sort ascending.
    pub fn upsert(&mut self, points: impl IntoIterator<Item = PricePoint>) {
        let mut by_date: BTreeMap<NaiveDate, PricePoint> = self
            .points
            .drain(..)
            .map(|p| (p.date, p))
            .collect();

        for point in points {
            by_date.insert(point.date, point);
        }

        self.points = by_date.into_values().collect();
    }

    /// Returns the removed point, if the date was present.
    pub fn remove_by_key(&mut self, date: NaiveDate) -> Option<PricePoint> {
        let idx = self.position(date)?;
        Some(self.points.remove(idx))
    }

    /// Remove every point carrying this row id.
    pub fn remove_by_id(&mut self, id: i64) -> Vec<PricePoint> {
        let (removed, kept): (Vec<_>, Vec<_>) = self
            .points
            .drain(..)
            .partition(|p| p.id == Some(id));
        self.points = kept;
        removed
    }

    pub fn get(&self, date: NaiveDate) -> Option<&PricePoint> {
        self.position(date).map(|idx| &self.points[idx])
    }

    pub fn find_by_id(&self, id: i64) -> Option<&PricePoint> {
        self.points.iter().find(|p| p.id == Some(id))
    }

    pub fn latest(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    pub fn previous(&self) -> Option<&PricePoint> {
        self.points.len().checked_sub(2).map(|idx| &self.points[idx])
    }

    /// The last `n` points (all of them when shorter).
    pub fn window_trailing(&self, n: usize) -> &[PricePoint] {
        &self.points[self.points.len().saturating_sub(n)..]
    }

    pub fn window_by_year(&self, year: i32) -> &[PricePoint] {
        let start = self.points.partition_point(|p| p.date.year() < year);
        let end = self.points.partition_point(|p| p.date.year() <= year);
        &self.points[start..end]
    }

    pub fn window_all(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn into_points(self) -> Vec<PricePoint> {
        self.points
    }

    fn position(&self, date: NaiveDate) -> Option<usize> {
        self.points.binary_search_by_key(&date, |p| p.date).ok()
    }
}
