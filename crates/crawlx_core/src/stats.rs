use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::ScrapedItem;

/// Dashboard counters derived from a fetched item collection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Stats {
    pub total: usize,
    pub today: usize,
    pub by_tag: BTreeMap<String, usize>,
}

impl Stats {
    /// `today` is the operator's local calendar date; `scraped_at` is already
    /// local wall-clock time.
    pub fn derive(items: &[ScrapedItem], today: NaiveDate) -> Self {
        let mut by_tag = BTreeMap::new();
        let mut today_count = 0;
        for item in items {
            if item.scraped_at.date() == today {
                today_count += 1;
            }
            for tag in item.tags.iter().flatten() {
                *by_tag.entry(tag.clone()).or_insert(0) += 1;
            }
        }
        Self {
            total: items.len(),
            today: today_count,
            by_tag,
        }
    }

    pub fn tag_count(&self, tag: &str) -> usize {
        self.by_tag.get(tag).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::Stats;
    use crate::{ItemId, ScrapedItem};
    use chrono::NaiveDate;
    use std::collections::BTreeSet;

    fn item(id: u32, tags: Option<&[&str]>, day: u32) -> ScrapedItem {
        ScrapedItem {
            id: ItemId::new(id.to_string()),
            source: "test".into(),
            title: format!("item {id}"),
            url: format!("https://example.com/{id}"),
            summary: None,
            tags: tags.map(|t| t.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>()),
            published_at: None,
            scraped_at: NaiveDate::from_ymd_opt(2024, 5, day)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn counts_tags_and_today() {
        let items = vec![
            item(1, Some(&["news"]), 1),
            item(2, Some(&["jobs"]), 2),
            item(3, Some(&["news", "remote"]), 2),
            item(4, None, 2),
        ];
        let stats = Stats::derive(&items, NaiveDate::from_ymd_opt(2024, 5, 2).unwrap());
        assert_eq!(stats.total, 4);
        assert_eq!(stats.today, 3);
        assert_eq!(stats.tag_count("news"), 2);
        assert_eq!(stats.tag_count("jobs"), 1);
        assert_eq!(stats.tag_count("remote"), 1);
        assert_eq!(stats.tag_count("tech"), 0);
    }

    #[test]
    fn empty_collection_is_all_zero() {
        let stats = Stats::derive(&[], NaiveDate::from_ymd_opt(2024, 5, 2).unwrap());
        assert_eq!(stats, Stats::default());
    }
}
