use std::collections::BTreeMap;

use jiff::{Timestamp, civil, tz::TimeZone};

use crate::{
    error::FieldErrors,
    models::{Comment, RankedMovie},
};

pub const PARAM_REQUIRED: &str = "This query parameter is required.";
pub const INVALID_DATE: &str = "This field needs to be a valid ISO 8601 date in UTC.";

/// Closed interval `[from, to]` over comment timestamps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateWindow {
    pub from: Timestamp,
    pub to: Timestamp,
}

impl DateWindow {
    /// Validates both bounds independently so that every bad parameter is
    /// reported at once.
    pub fn parse(from: Option<&str>, to: Option<&str>) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();
        let from = parse_bound("from", from, &mut errors);
        let to = parse_bound("to", to, &mut errors);

        match (from, to) {
            (Some(from), Some(to)) if errors.is_empty() => Ok(Self { from, to }),
            _ => Err(errors),
        }
    }

    pub fn contains(&self, at: Timestamp) -> bool {
        self.from <= at && at <= self.to
    }
}

fn parse_bound(
    name: &'static str,
    raw: Option<&str>,
    errors: &mut FieldErrors,
) -> Option<Timestamp> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        errors.insert(name, PARAM_REQUIRED);
        return None;
    };
    let parsed = parse_utc(raw);
    if parsed.is_none() {
        errors.insert(name, INVALID_DATE);
    }
    parsed
}

/// ISO 8601 instant. Values without an offset, including bare dates, are read
/// as UTC.
pub fn parse_utc(raw: &str) -> Option<Timestamp> {
    if let Ok(ts) = raw.parse::<Timestamp>() {
        return Some(ts);
    }
    if let Ok(dt) = raw.parse::<civil::DateTime>() {
        return dt.to_zoned(TimeZone::UTC).ok().map(|z| z.timestamp());
    }
    if let Ok(date) = raw.parse::<civil::Date>() {
        return date.to_zoned(TimeZone::UTC).ok().map(|z| z.timestamp());
    }
    None
}

/// Counts comments per movie and ranks movies by that count, highest first.
///
/// Ranks follow SQL `RANK()`: equal counts share a rank and the next distinct
/// count is ranked by its position, so two movies tied at the top are both 1
/// and the following one is 3. Within a rank, movies are listed by id.
/// Movies without comments in the input do not appear.
pub fn rank_by_comments<'a, I>(comments: I) -> Vec<RankedMovie>
where
    I: IntoIterator<Item = &'a Comment>,
{
    let mut totals: BTreeMap<i32, usize> = BTreeMap::new();
    for comment in comments {
        *totals.entry(comment.movie_id).or_default() += 1;
    }

    let mut counted: Vec<(i32, usize)> = totals.into_iter().collect();
    counted.sort_by(|(id_a, total_a), (id_b, total_b)| {
        total_b.cmp(total_a).then_with(|| id_a.cmp(id_b))
    });

    let mut ranked = Vec::with_capacity(counted.len());
    let mut rank = 0;
    let mut last_total = None;
    for (position, (movie_id, total_comments)) in counted.into_iter().enumerate() {
        if last_total != Some(total_comments) {
            rank = position + 1;
            last_total = Some(total_comments);
        }
        ranked.push(RankedMovie { movie_id, rank, total_comments });
    }
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(raw: &str) -> Timestamp {
        raw.parse().unwrap()
    }

    fn comments(entries: &[(i32, &str)]) -> Vec<Comment> {
        entries
            .iter()
            .enumerate()
            .map(|(i, (movie_id, at))| Comment {
                id: i as i32 + 1,
                movie_id: *movie_id,
                comment: String::new(),
                added_on: ts(at),
            })
            .collect()
    }

    fn ranks(ranked: &[RankedMovie]) -> Vec<(i32, usize, usize)> {
        ranked.iter().map(|r| (r.movie_id, r.rank, r.total_comments)).collect()
    }

    #[test]
    fn ties_share_rank_and_skip_the_next() {
        let all = comments(&[
            (7, "2019-10-10T00:00:00Z"),
            (3, "2019-10-10T00:00:00Z"),
            (3, "2019-10-10T00:00:00Z"),
            (5, "2019-10-10T00:00:00Z"),
            (5, "2019-10-10T00:00:00Z"),
        ]);

        assert_eq!(ranks(&rank_by_comments(&all)), vec![(3, 1, 2), (5, 1, 2), (7, 3, 1)]);
    }

    #[test]
    fn windowed_ranking_matches_fixture() {
        let all = comments(&[
            (1, "2019-10-10T00:00:00Z"),
            (1, "2019-10-11T00:00:00Z"),
            (1, "2019-10-12T00:00:00Z"),
            (2, "2019-10-10T00:00:00Z"),
            (2, "2019-10-12T00:00:00Z"),
            (3, "2019-10-11T00:00:00Z"),
            (3, "2019-10-11T00:00:00Z"),
            (3, "2019-10-11T00:00:00Z"),
            (3, "2019-10-12T00:00:00Z"),
            (4, "2019-10-09T00:00:00Z"),
            (4, "2019-10-09T00:00:00Z"),
            (4, "2019-10-09T00:00:00Z"),
            (4, "2019-10-10T00:00:00Z"),
            (4, "2019-10-11T00:00:00Z"),
            (5, "2019-10-09T00:00:00Z"),
            (5, "2019-10-10T00:00:00Z"),
        ]);
        let window = DateWindow::parse(Some("2019-10-09T00:00:00Z"), Some("2019-10-11T00:00:00Z"))
            .unwrap();

        let inside: Vec<&Comment> = all.iter().filter(|c| window.contains(c.added_on)).collect();
        let ranked = rank_by_comments(inside.iter().copied());

        assert_eq!(
            ranks(&ranked),
            vec![(4, 1, 5), (3, 2, 3), (1, 3, 2), (5, 3, 2), (2, 5, 1)]
        );
        let total: usize = ranked.iter().map(|r| r.total_comments).sum();
        assert_eq!(total, inside.len());
    }

    #[test]
    fn empty_input_ranks_nothing() {
        assert!(rank_by_comments(&Vec::<Comment>::new()).is_empty());
    }

    #[test]
    fn missing_bounds_are_reported_together() {
        let errors = DateWindow::parse(None, None).unwrap_err();
        assert_eq!(errors.get("from"), Some(&PARAM_REQUIRED));
        assert_eq!(errors.get("to"), Some(&PARAM_REQUIRED));
    }

    #[test]
    fn malformed_bounds_are_reported_together() {
        let errors = DateWindow::parse(Some("2019 Fb 18"), Some("")).unwrap_err();
        assert_eq!(errors.get("from"), Some(&INVALID_DATE));
        assert_eq!(errors.get("to"), Some(&PARAM_REQUIRED));
    }

    #[test]
    fn dates_without_offset_are_utc() {
        assert_eq!(parse_utc("2019-10-09"), Some(ts("2019-10-09T00:00:00Z")));
        assert_eq!(parse_utc("2019-10-09T12:30:00"), Some(ts("2019-10-09T12:30:00Z")));
        assert_eq!(parse_utc("2019-10-09T14:30:00+02:00"), Some(ts("2019-10-09T12:30:00Z")));
        assert_eq!(parse_utc("yesterday"), None);
    }
}
