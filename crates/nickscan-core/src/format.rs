use indexmap::IndexMap;
use nickscan_config::Config;
use nickscan_types::{AnalysisResult, AutoCopyType, PlayerStats, StatValue};

const PLACEHOLDER: &str = "{value}";
const MISSING: &str = "-";

/// Renders stats into export text according to the user's selection
pub struct ResultFormatter<'a> {
    selected: &'a IndexMap<String, bool>,
    templates: &'a IndexMap<String, String>,
}

impl<'a> ResultFormatter<'a> {
    pub fn new(
        selected: &'a IndexMap<String, bool>,
        templates: &'a IndexMap<String, String>,
    ) -> Self {
        Self {
            selected,
            templates,
        }
    }

    pub fn from_config(config: &'a Config) -> Self {
        Self::new(&config.selected_stats, &config.stats_format_templates)
    }

    /// Selected stats joined by a space, in selection order.
    ///
    /// Falls back to the canonical summary when nothing selected is present.
    pub fn format_stats(&self, stats: &PlayerStats) -> String {
        let parts: Vec<String> = self
            .selected
            .iter()
            .filter(|(_, enabled)| **enabled)
            .filter_map(|(key, _)| {
                let value = stats.get(key)?;
                Some(self.render(key, &value))
            })
            .collect();

        if parts.is_empty() {
            return canonical_summary(stats);
        }
        parts.join(" ")
    }

    pub fn export_text(&self, result: &AnalysisResult, kind: AutoCopyType) -> String {
        match kind {
            AutoCopyType::Stats => self.format_stats(&result.stats),
            AutoCopyType::Analysis => result.analysis.clone(),
            AutoCopyType::Both => {
                format!("{}\n\n{}", self.format_stats(&result.stats), result.analysis)
            }
        }
    }

    fn render(&self, key: &str, value: &StatValue) -> String {
        let value = value.to_string();
        match self.templates.get(key) {
            Some(template) => template.replacen(PLACEHOLDER, &value, 1),
            None => format!("{}:{value}", key.to_uppercase()),
        }
    }
}

fn canonical_summary(stats: &PlayerStats) -> String {
    let show = |v: &Option<StatValue>| {
        v.as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| MISSING.to_string())
    };

    format!(
        "VPIP:{} PFR:{} 3B:{} F3B:{} WTSD:{} WSD:{} ({} hands)",
        show(&stats.vpip),
        show(&stats.pfr),
        show(&stats.three_bet),
        show(&stats.fold_to_3bet),
        show(&stats.wtsd),
        show(&stats.wsd),
        show(&stats.total_hands),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map<V: Clone>(pairs: &[(&str, V)]) -> IndexMap<String, V> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    fn full_stats() -> PlayerStats {
        PlayerStats::new("Alice")
            .with("vpip", 24)
            .with("pfr", 18)
            .with("threeBet", 8)
            .with("foldTo3Bet", 55)
            .with("wtsd", 28)
            .with("wsd", 52)
            .with("totalHands", 1200)
    }

    #[test]
    fn test_single_selected_stat_uses_template() {
        let selected = map(&[("vpip", true)]);
        let templates = map(&[("vpip", "VPIP={value}".to_string())]);
        let stats = PlayerStats::new("Alice").with("vpip", 24);

        let text = ResultFormatter::new(&selected, &templates).format_stats(&stats);
        assert_eq!(text, "VPIP=24");
    }

    #[test]
    fn test_empty_selection_falls_back_to_summary() {
        let selected = IndexMap::new();
        let templates = IndexMap::new();

        let text = ResultFormatter::new(&selected, &templates).format_stats(&full_stats());
        assert_eq!(text, "VPIP:24 PFR:18 3B:8 F3B:55 WTSD:28 WSD:52 (1200 hands)");
    }

    #[test]
    fn test_selection_order_and_skipping() {
        let selected = map(&[
            ("wsd", true),
            ("pfr", false),
            ("cbet_flop", true),
            ("vpip", true),
        ]);
        let templates = map(&[
            ("wsd", "W$SD {value}%".to_string()),
            ("vpip", "V:{value}".to_string()),
        ]);

        let text = ResultFormatter::new(&selected, &templates).format_stats(&full_stats());
        // cbet_flop is selected but absent, pfr is present but unselected
        assert_eq!(text, "W$SD 52% V:24");
    }

    #[test]
    fn test_missing_template_uses_uppercase_key() {
        let selected = map(&[("bb_100", true)]);
        let templates = IndexMap::new();
        let stats = full_stats().with("bb_100", 3.5);

        let text = ResultFormatter::new(&selected, &templates).format_stats(&stats);
        assert_eq!(text, "BB_100:3.5");
    }

    #[test]
    fn test_selected_but_absent_falls_back() {
        let selected = map(&[("cbet_turn", true)]);
        let templates = IndexMap::new();
        let stats = PlayerStats::new("Bob").with("vpip", 40);

        let text = ResultFormatter::new(&selected, &templates).format_stats(&stats);
        assert_eq!(text, "VPIP:40 PFR:- 3B:- F3B:- WTSD:- WSD:- (- hands)");
    }

    #[test]
    fn test_export_text_variants() {
        let selected = map(&[("vpip", true)]);
        let templates = map(&[("vpip", "VPIP:{value}".to_string())]);
        let formatter = ResultFormatter::new(&selected, &templates);
        let result = AnalysisResult {
            nick: "Alice".into(),
            stats: full_stats(),
            analysis: "Tight.".into(),
        };

        assert_eq!(formatter.export_text(&result, AutoCopyType::Stats), "VPIP:24");
        assert_eq!(formatter.export_text(&result, AutoCopyType::Analysis), "Tight.");
        assert_eq!(
            formatter.export_text(&result, AutoCopyType::Both),
            "VPIP:24\n\nTight."
        );
    }
}
