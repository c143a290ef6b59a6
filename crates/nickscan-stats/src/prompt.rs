use std::fmt::Write;

use nickscan_types::PlayerStats;

/// Marker the model sometimes uses to append a stats recap we do not want
pub const STATS_TAIL_MARKER: &str = "📊 Stats";

/// Below this many hands reads are flagged as preliminary
pub const LOW_SAMPLE_HANDS: f64 = 1000.0;

/// Stats listed in the prompt, in order, with their labels
const PROMPT_STATS: &[(&str, &str, bool)] = &[
    ("total_hands", "Hands", false),
    ("bb_100", "BB/100", false),
    ("win_usd", "Winnings (USD)", false),
    ("vpip", "VPIP", true),
    ("pfr", "PFR", true),
    ("three_bet", "3-Bet", true),
    ("fold_to_3bet", "Fold to 3-Bet", true),
    ("four_bet_preflop_pct", "4-Bet", true),
    ("fold_to_4bet_pct", "Fold to 4-Bet", true),
    ("cbet_flop", "C-Bet Flop", true),
    ("cbet_turn", "C-Bet Turn", true),
    ("wwsf", "WWSF", true),
    ("wtsd", "WTSD", true),
    ("wsd", "WSD", true),
    ("limp_pct", "Limp Preflop", true),
    ("limp_raise_pct", "Limp-Raise", true),
    ("fold_to_flop_cbet_pct", "Fold to Flop C-Bet", true),
    ("fold_to_turn_cbet_pct", "Fold to Turn C-Bet", true),
    ("probe_bet_turn_pct", "Probe Bet Turn", true),
    ("fold_to_river_bet_pct", "Fold to River Bet", true),
    ("bet_river_pct", "Bet River", true),
    ("overbet_turn_pct", "Overbet Turn", true),
    ("overbet_river_pct", "Overbet River", true),
    ("wsdwbr_pct", "WSDwBR", true),
];

/// Describe the VPIP–PFR gap; missing or unparsable values count as zero
pub fn gap_label(stats: &PlayerStats) -> &'static str {
    let read = |key| stats.get(key).and_then(|v| v.as_f64()).unwrap_or(0.0);
    let gap = read("vpip") - read("pfr");

    if gap < 4.0 {
        "minimal (TAG style)"
    } else if gap < 8.0 {
        "moderate"
    } else if gap < 12.0 {
        "notable (calls a lot)"
    } else {
        "extreme (very passive)"
    }
}

fn low_sample(stats: &PlayerStats) -> bool {
    stats
        .get("total_hands")
        .and_then(|v| v.as_f64())
        .is_some_and(|hands| hands < LOW_SAMPLE_HANDS)
}

pub fn build_prompt(stats: &PlayerStats) -> String {
    let nick = &stats.nick;
    let mut prompt = format!(
        "You are a professional online cash game player (NL50-NL100). Analyse an opponent's \
stats and write a short, clear, actionable report, like a note for another regular.\n\n\
Be direct: no filler, no theory. Use real poker language (\"LAG\", \"gives up on the turn\", \
\"floats flop\", \"light 3-bets\").\n\n\
Read the stats together, not one by one. For example:\n\
- High VPIP with low PFR means passive.\n\
- High flop C-Bet with low turn C-Bet means inconsistent aggression.\n\
- High WTSD with low WSD means calls too much and wins too little.\n\
- Fold to 3-Bet is only a leak above 65% or below 35%, or when it does not fit the style.\n\n\
VPIP-PFR gap: {gap}\n",
        gap = gap_label(stats),
    );

    if low_sample(stats) {
        prompt.push_str(
            "The sample is under 1000 hands: say so and treat every read as preliminary.\n",
        );
    }

    let _ = write!(
        prompt,
        "\nDo not finish with a list of numeric stats. Only the analysis.\n\n\
---\n\n\
EXACT REPORT FORMAT:\n\n\
🎯 Report on {nick}:\n\n\
1️⃣ Playing style:\n[1-2 lines]\n\n\
2️⃣ Exploitable leaks:\n- [leak 1]\n- [leak 2]\n- [leak 3]\n\n\
3️⃣ How to exploit:\n[concise adjustments]\n\n\
---\n\n\
Available stats:\n"
    );

    for (key, label, percent) in PROMPT_STATS {
        if let Some(value) = stats.get(key) {
            let unit = if *percent { "%" } else { "" };
            let _ = writeln!(prompt, "- {label}: {value}{unit}");
        }
    }

    prompt
}

/// Drop a trailing stats recap block and surrounding whitespace
pub fn strip_stats_tail(reply: &str) -> &str {
    let reply = reply.trim();
    match reply.split_once(STATS_TAIL_MARKER) {
        Some((analysis, _)) => analysis.trim(),
        None => reply,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(vpip: f64, pfr: f64) -> PlayerStats {
        PlayerStats::new("Alice").with("vpip", vpip).with("pfr", pfr)
    }

    #[test]
    fn test_gap_label_thresholds() {
        assert_eq!(gap_label(&stats(20.0, 17.0)), "minimal (TAG style)");
        assert_eq!(gap_label(&stats(24.0, 20.0)), "moderate");
        assert_eq!(gap_label(&stats(30.0, 19.0)), "notable (calls a lot)");
        assert_eq!(gap_label(&stats(45.0, 12.0)), "extreme (very passive)");
    }

    #[test]
    fn test_gap_label_reads_text_values() {
        let stats = PlayerStats::new("Bob").with("vpip", "40%").with("pfr", "10");
        assert_eq!(gap_label(&stats), "extreme (very passive)");
        assert_eq!(gap_label(&PlayerStats::new("Nobody")), "minimal (TAG style)");
    }

    #[test]
    fn test_prompt_names_player_and_lists_present_stats() {
        let stats = stats(24.0, 18.0).with("total_hands", 5000).with("cbet_flop", 61.5);
        let prompt = build_prompt(&stats);

        assert!(prompt.contains("Report on Alice"));
        assert!(prompt.contains("- VPIP: 24%"));
        assert!(prompt.contains("- C-Bet Flop: 61.5%"));
        assert!(prompt.contains("- Hands: 5000\n"));
        assert!(!prompt.contains("WWSF"));
        assert!(!prompt.contains("under 1000 hands"));
    }

    #[test]
    fn test_small_sample_is_flagged() {
        let prompt = build_prompt(&stats(24.0, 18.0).with("total_hands", 420));
        assert!(prompt.contains("under 1000 hands"));
    }

    #[test]
    fn test_stats_tail_is_stripped() {
        let reply = "  🎯 Report on Alice:\nTight.\n\n📊 Stats\n- VPIP: 24%\n";
        assert_eq!(strip_stats_tail(reply), "🎯 Report on Alice:\nTight.");
        assert_eq!(strip_stats_tail(" plain answer \n"), "plain answer");
    }
}
