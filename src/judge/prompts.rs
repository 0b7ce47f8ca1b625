//! Prompt text for each pair

use crate::data::{Metric, PromptRecord, TeamStat, TeamTable};
use crate::features::PairRegistry;

pub const BETTER_OFFENSE: &str = "better_offense";
pub const STYLE_COMPARISON: &str = "style_comparison";

/// One-paragraph summary of a team's offense
pub fn describe_team(stat: &TeamStat) -> String {
    format!(
        "{} ran {} plays, gaining {} total yards ({:.2} yards per play). \
         They rushed {} times and passed {} times (rush_pct={:.1}, pass_pct={:.1}). \
         They scored {} touchdowns, took {} penalties, and averaged {:.2} yards per touchdown.",
        stat.team,
        stat.get(Metric::TotalPlays) as i64,
        stat.get(Metric::TotalYards) as i64,
        stat.get(Metric::AvgYardsPerPlay),
        stat.get(Metric::RushPlays) as i64,
        stat.get(Metric::PassPlays) as i64,
        stat.get(Metric::RushPct),
        stat.get(Metric::PassPct),
        stat.get(Metric::Touchdowns) as i64,
        stat.get(Metric::Penalties) as i64,
        stat.get(Metric::YardsPerTouchdown),
    )
}

fn better_offense_prompt(desc_a: &str, desc_b: &str) -> String {
    format!(
        "You are an NFL offensive analytics expert.\n\n\
         Below are summaries for two teams' offenses from the same season.\n\n\
         Team A:\n{desc_a}\n\n\
         Team B:\n{desc_b}\n\n\
         Question:\n\
         Based ONLY on the numbers above (and not on reputation or history), which offense \
         appears stronger overall, Team A or Team B?\n\
         Choose one team and explain your reasoning in 3-5 sentences, citing specific stats \
         (like yards, efficiency, or penalties) in your explanation."
    )
}

fn style_comparison_prompt(desc_a: &str, desc_b: &str) -> String {
    format!(
        "You are a football strategy analyst.\n\n\
         Here are offensive summaries for two NFL teams.\n\n\
         Team A:\n{desc_a}\n\n\
         Team B:\n{desc_b}\n\n\
         Question:\n\
         Compare the offensive STYLES of Team A and Team B.\n\
         Do they look more run-heavy or pass-heavy?\n\
         Discuss how their play selection (rush vs pass), efficiency (yards per play), and \
         discipline (penalties) might influence the kind of game plan each team prefers.\n\
         Answer in 3-5 sentences."
    )
}

/// Two prompts per pair: which offense is better, and how their styles differ.
/// Pairs naming a team without statistics are skipped.
pub fn build_prompts(registry: &PairRegistry, teams: &TeamTable) -> Vec<PromptRecord> {
    let mut records = Vec::with_capacity(registry.len() * 2);

    for pair in registry.pairs() {
        let (Some(a), Some(b)) = (teams.get(&pair.team_a), teams.get(&pair.team_b)) else {
            log::warn!(
                "Skipping pair {}: missing stats for {} or {}",
                pair.pair_id,
                pair.team_a,
                pair.team_b
            );
            continue;
        };

        let desc_a = describe_team(a);
        let desc_b = describe_team(b);
        let templates: [(&str, String); 2] = [
            (BETTER_OFFENSE, better_offense_prompt(&desc_a, &desc_b)),
            (STYLE_COMPARISON, style_comparison_prompt(&desc_a, &desc_b)),
        ];

        for (prompt_type, prompt) in templates {
            records.push(PromptRecord {
                pair_id: pair.pair_id.clone(),
                prompt_type: prompt_type.to_string(),
                team_a: pair.team_a.clone(),
                team_b: pair.team_b.clone(),
                prompt,
            });
        }
    }

    log::info!(
        "Generated {} prompts for {} pairs",
        records.len(),
        records.len() / 2
    );
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::METRIC_COUNT;
    use crate::features::Pair;

    fn teams() -> TeamTable {
        TeamTable::new(vec![
            TeamStat::new(
                "KC",
                [1000.0, 6000.0, 6.0, 400.0, 600.0, 50.0, 80.0, 0.4, 0.6, 120.0],
            ),
            TeamStat::new("BUF", [1.0; METRIC_COUNT]),
        ])
        .unwrap()
    }

    fn pair(id: &str, a: &str, b: &str) -> Pair {
        Pair {
            pair_id: id.to_string(),
            team_a: a.to_string(),
            team_b: b.to_string(),
            team_a_strength: 0.0,
            team_b_strength: 0.0,
        }
    }

    #[test]
    fn test_describe_team() {
        let table = teams();
        let text = describe_team(table.get("KC").unwrap());
        assert!(text.starts_with("KC ran 1000 plays, gaining 6000 total yards (6.00 yards per play)."));
        assert!(text.contains("rush_pct=0.4"));
        assert!(text.contains("120.00 yards per touchdown"));
    }

    #[test]
    fn test_two_prompts_per_pair() {
        let registry = PairRegistry::from_pairs(vec![pair("PAIR_1", "KC", "BUF")]);
        let prompts = build_prompts(&registry, &teams());

        assert_eq!(prompts.len(), 2);
        assert_eq!(prompts[0].prompt_type, BETTER_OFFENSE);
        assert_eq!(prompts[1].prompt_type, STYLE_COMPARISON);
        assert!(prompts[0].prompt.contains("Team A:\nKC ran"));
        assert!(prompts[0].prompt.contains("Team A or Team B?"));
    }

    #[test]
    fn test_pair_without_stats_skipped() {
        let registry = PairRegistry::from_pairs(vec![
            pair("PAIR_1", "KC", "NYJ"),
            pair("PAIR_2", "BUF", "KC"),
        ]);
        let prompts = build_prompts(&registry, &teams());
        assert_eq!(prompts.len(), 2);
        assert!(prompts.iter().all(|p| p.pair_id == "PAIR_2"));
    }
}
