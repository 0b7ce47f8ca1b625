//! Stage orchestration over the configured file paths
//!
//! Each stage reads its inputs from `Config::paths`, writes its output table,
//! and returns a small summary for the CLI to print.

use burn::tensor::backend::AutodiffBackend;
use std::time::Duration;

use crate::data::plays::load_plays;
use crate::data::records::{read_jsonl, write_jsonl, JsonlWriter};
use crate::data::{AnswerRecord, PromptRecord, TeamTable};
use crate::features::{summarize_plays, FeatureDifferencer, PairRegistry, StrengthRanker, TrainingTable};
use crate::judge::{build_prompts, Judge, JudgeRunner, LabelJoiner, LabelTable};
use crate::training::{ModelReport, PreferenceModel};
use crate::{Config, OffenseError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct SummarizeSummary {
    pub plays: usize,
    pub teams: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PairsSummary {
    pub teams: usize,
    pub pairs: usize,
    /// Strength source that produced the ranking
    pub source: String,
    pub unpaired: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PromptsSummary {
    pub pairs: usize,
    pub prompts: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AskSummary {
    pub prompts: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelsSummary {
    pub answers: usize,
    pub labels: usize,
    pub parsed: usize,
    pub unknown: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeaturesSummary {
    pub labels: usize,
    pub rows: usize,
}

/// Outcome of the offline run from pairing through training
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub pairs: PairsSummary,
    pub labels: LabelsSummary,
    pub features: FeaturesSummary,
    pub report: ModelReport,
}

pub struct Pipeline {
    config: Config,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        Pipeline { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Play-by-play rows to the per-team statistics table
    pub fn summarize(&self) -> Result<SummarizeSummary> {
        let paths = &self.config.paths;
        log::info!("Loading plays from {}", paths.plays);
        let plays = load_plays(&paths.plays)?;
        let table = summarize_plays(&plays)?;
        table.save(&paths.team_summary)?;
        log::info!("Saved team summary to {}", paths.team_summary);

        Ok(SummarizeSummary {
            plays: plays.len(),
            teams: table.len(),
        })
    }

    /// Rank teams and write the pair table
    pub fn pairs(&self) -> Result<PairsSummary> {
        let teams = self.load_teams()?;
        let (registry, summary) = rank_and_pair(&teams)?;
        registry.save(&self.config.paths.pairs)?;
        log::info!("Saved {} pairs to {}", registry.len(), self.config.paths.pairs);
        Ok(summary)
    }

    /// Render judge prompts for every pair
    pub fn prompts(&self) -> Result<PromptsSummary> {
        let teams = self.load_teams()?;
        let registry = PairRegistry::load(&self.config.paths.pairs)?;
        let prompts = build_prompts(&registry, &teams);
        write_jsonl(&self.config.paths.prompts, &prompts)?;
        log::info!("Saved {} prompts to {}", prompts.len(), self.config.paths.prompts);

        Ok(PromptsSummary {
            pairs: registry.len(),
            prompts: prompts.len(),
        })
    }

    /// Send every prompt to the judge, appending each answer to the answers file
    /// as it arrives
    pub fn ask<J: Judge>(&self, judge: &J) -> Result<AskSummary> {
        let prompts: Vec<PromptRecord> = read_jsonl(&self.config.paths.prompts)?;
        let runner = JudgeRunner::new(judge, Duration::from_millis(self.config.judge.delay_ms));
        let mut out = JsonlWriter::create(&self.config.paths.answers)?;
        let answers = runner.ask_all(&prompts, |answer| out.append(answer))?;
        log::info!("Saved answers to {}", self.config.paths.answers);

        Ok(AskSummary {
            prompts: prompts.len(),
            failed: answers.iter().filter(|a| a.error.is_some()).count(),
        })
    }

    /// Parse answers into preference labels joined with the pair table
    pub fn labels(&self) -> Result<LabelsSummary> {
        let registry = PairRegistry::load(&self.config.paths.pairs)?;
        let (labels, summary) = self.join_labels(&registry)?;
        labels.save(&self.config.paths.labels)?;
        log::info!("Saved labels to {}", self.config.paths.labels);
        Ok(summary)
    }

    /// Team stat differences for every labelled pair
    pub fn features(&self) -> Result<FeaturesSummary> {
        let teams = self.load_teams()?;
        let labels = LabelTable::load(&self.config.paths.labels)?;
        let (table, summary) = difference(&teams, &labels)?;
        table.save(&self.config.paths.training_data)?;
        log::info!("Saved training data to {}", self.config.paths.training_data);
        Ok(summary)
    }

    /// Fit the preference model and write its summary and artifact
    pub fn train<B: AutodiffBackend>(&self, device: B::Device) -> Result<ModelReport> {
        let table = TrainingTable::load(&self.config.paths.training_data)?;
        let report = self.fit::<B>(&table, device)?;
        self.save_report(&report)?;
        Ok(report)
    }

    /// Pairs, labels, features, and training from existing answers.
    ///
    /// Every table is computed before any is written, so a failing stage
    /// leaves the previous outputs untouched.
    pub fn run<B: AutodiffBackend>(&self, device: B::Device) -> Result<RunSummary> {
        let teams = self.load_teams()?;
        let (registry, pairs) = rank_and_pair(&teams)?;
        let (labels, label_summary) = self.join_labels(&registry)?;
        let (table, features) = difference(&teams, &labels)?;
        let report = self.fit::<B>(&table, device)?;

        let paths = &self.config.paths;
        registry.save(&paths.pairs)?;
        labels.save(&paths.labels)?;
        table.save(&paths.training_data)?;
        self.save_report(&report)?;
        log::info!("Offline run complete");

        Ok(RunSummary {
            pairs,
            labels: label_summary,
            features,
            report,
        })
    }

    fn load_teams(&self) -> Result<TeamTable> {
        log::info!("Loading team summary from {}", self.config.paths.team_summary);
        TeamTable::load(&self.config.paths.team_summary)
    }

    fn join_labels(&self, registry: &PairRegistry) -> Result<(LabelTable, LabelsSummary)> {
        let answers: Vec<AnswerRecord> = read_jsonl(&self.config.paths.answers)?;
        let joiner = LabelJoiner::new(self.config.labels.question_type.as_str());
        let labels = joiner.join(&answers, registry)?;
        for (kind, count) in &labels.other_types {
            log::debug!("Ignored {} answers of type '{}'", count, kind);
        }

        let summary = LabelsSummary {
            answers: answers.len(),
            labels: labels.len(),
            parsed: labels.parsed(),
            unknown: labels.unknown,
        };
        Ok((labels, summary))
    }

    fn fit<B: AutodiffBackend>(&self, table: &TrainingTable, device: B::Device) -> Result<ModelReport> {
        if table.is_empty() {
            return Err(OffenseError::InsufficientData(
                "training table has no labelled rows".to_string(),
            ));
        }
        log::info!("Training preference model on {} rows", table.len());
        PreferenceModel::new(self.config.training.clone()).fit_evaluate::<B>(table, device)
    }

    fn save_report(&self, report: &ModelReport) -> Result<()> {
        let paths = &self.config.paths;
        report.save_summary(&paths.model_summary)?;
        report.save_artifact(&paths.model_artifact)?;
        log::info!(
            "Saved model summary to {} and artifact to {}",
            paths.model_summary,
            paths.model_artifact
        );
        Ok(())
    }
}

fn rank_and_pair(teams: &TeamTable) -> Result<(PairRegistry, PairsSummary)> {
    let ranking = StrengthRanker::new().rank(teams)?;
    let registry = PairRegistry::from_ranking(&ranking);
    let summary = PairsSummary {
        teams: ranking.teams.len(),
        pairs: registry.len(),
        source: ranking.source.clone(),
        unpaired: registry.unpaired().map(str::to_string),
    };
    Ok((registry, summary))
}

fn difference(teams: &TeamTable, labels: &LabelTable) -> Result<(TrainingTable, FeaturesSummary)> {
    let table = FeatureDifferencer::new(teams).build(&labels.labels)?;
    let summary = FeaturesSummary {
        labels: labels.len(),
        rows: table.len(),
    };
    Ok((table, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Metric, TeamStat, METRIC_COUNT};
    use crate::training::DefaultBackend;
    use std::fs;
    use std::path::Path;

    fn config_in(dir: &Path) -> Config {
        let mut config = Config::default();
        let path = |name: &str| dir.join(name).to_string_lossy().into_owned();
        config.paths.plays = path("plays.csv");
        config.paths.team_summary = path("team_summary.csv");
        config.paths.pairs = path("out/team_pairs.csv");
        config.paths.prompts = path("out/prompts.jsonl");
        config.paths.answers = path("answers.jsonl");
        config.paths.labels = path("out/labels.csv");
        config.paths.training_data = path("out/training.csv");
        config.paths.model_summary = path("out/model_summary.txt");
        config.paths.model_artifact = path("out/model.json");
        config.judge.delay_ms = 0;
        config.training.epochs = 200;
        config
    }

    fn team(name: &str, win_pct: f64, yards: f64) -> TeamStat {
        let mut metrics = [0.0; METRIC_COUNT];
        metrics[Metric::TotalPlays.index()] = 1000.0;
        metrics[Metric::TotalYards.index()] = yards;
        metrics[Metric::AvgYardsPerPlay.index()] = yards / 1000.0;
        metrics[Metric::Touchdowns.index()] = yards / 150.0;
        TeamStat::new(name, metrics).with_win_pct(win_pct)
    }

    fn answer(pair_id: &str, prompt_type: &str, text: &str) -> AnswerRecord {
        AnswerRecord {
            pair_id: pair_id.to_string(),
            prompt_type: Some(prompt_type.to_string()),
            team_a: None,
            team_b: None,
            prompt: None,
            answer: Some(text.to_string()),
            error: None,
        }
    }

    /// Sixteen teams, eight pairs, judge alternating between sides
    fn seed_league(config: &Config) {
        let teams: Vec<TeamStat> = (0..16)
            .map(|i| {
                let yards = 5000.0 + ((i * 37) % 16) as f64 * 90.0;
                team(&format!("T{:02}", i), 0.95 - i as f64 * 0.05, yards)
            })
            .collect();
        TeamTable::new(teams)
            .unwrap()
            .save(&config.paths.team_summary)
            .unwrap();

        let mut answers = Vec::new();
        for n in 1..=8 {
            let id = format!("PAIR_{}", n);
            let text = if n % 2 == 1 {
                "Team A has the stronger offense."
            } else {
                "Team B is better overall."
            };
            answers.push(answer(&id, "better_offense", text));
            answers.push(answer(&id, "style_comparison", "Team A runs more."));
        }
        write_jsonl(&config.paths.answers, &answers).unwrap();
    }

    struct EchoJudge;

    impl Judge for EchoJudge {
        fn ask(&self, prompt: &str) -> Result<String> {
            if prompt.contains("STYLES") {
                Err(OffenseError::ExternalService("rate limited".to_string()))
            } else {
                Ok("Team A".to_string())
            }
        }
    }

    #[test]
    fn test_offline_run_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        seed_league(&config);
        let pipeline = Pipeline::new(config.clone());

        let first = pipeline.run::<DefaultBackend>(Default::default()).unwrap();
        let read = |p: &String| fs::read(p).unwrap();
        let pairs = read(&config.paths.pairs);
        let labels = read(&config.paths.labels);
        let training = read(&config.paths.training_data);

        let second = pipeline.run::<DefaultBackend>(Default::default()).unwrap();
        assert_eq!(read(&config.paths.pairs), pairs);
        assert_eq!(read(&config.paths.labels), labels);
        assert_eq!(read(&config.paths.training_data), training);
        assert_eq!(first.report.accuracy(), second.report.accuracy());

        assert_eq!(first.pairs.pairs, 8);
        assert_eq!(first.pairs.source, "win_pct");
        assert_eq!(first.labels.labels, 8);
        assert_eq!(first.labels.answers, 16);
        assert_eq!(first.features.rows, 8);
        assert!(Path::new(&config.paths.model_summary).exists());
        assert!(Path::new(&config.paths.model_artifact).exists());
    }

    #[test]
    fn test_four_team_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let teams = vec![
            team("Chiefs", 0.7, 6200.0),
            team("Bills", 0.9, 6500.0),
            team("Jets", 0.3, 4800.0),
            team("Bears", 0.5, 5400.0),
        ];
        TeamTable::new(teams)
            .unwrap()
            .save(&config.paths.team_summary)
            .unwrap();
        let pipeline = Pipeline::new(config.clone());

        let summary = pipeline.pairs().unwrap();
        assert_eq!(summary.pairs, 2);
        let registry = PairRegistry::load(&config.paths.pairs).unwrap();
        let first = registry.resolve("PAIR_1").unwrap();
        assert_eq!((first.team_a.as_str(), first.team_b.as_str()), ("Bills", "Chiefs"));
        assert_eq!((first.team_a_strength, first.team_b_strength), (0.9, 0.7));
        let second = registry.resolve("PAIR_2").unwrap();
        assert_eq!((second.team_a_strength, second.team_b_strength), (0.5, 0.3));

        write_jsonl(
            &config.paths.answers,
            &[
                answer("PAIR_1", "better_offense", "Team A"),
                answer("PAIR_2", "better_offense", "Hard to say."),
            ],
        )
        .unwrap();
        let labels = pipeline.labels().unwrap();
        assert_eq!(labels.parsed, 1);
        assert_eq!(labels.unknown, 1);

        let table = LabelTable::load(&config.paths.labels).unwrap();
        assert_eq!(table.labels[0].llm_prefers_team_a, Some(1));
        assert_eq!(table.labels[1].llm_prefers_team_a, None);

        let features = pipeline.features().unwrap();
        assert_eq!(features.rows, 1);
        let training = TrainingTable::load(&config.paths.training_data).unwrap();
        assert_eq!(training.rows[0].diff(Metric::TotalYards), 300.0);

        // One labelled row cannot be split
        assert!(matches!(
            pipeline.train::<DefaultBackend>(Default::default()),
            Err(OffenseError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_run_writes_nothing_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        seed_league(&config);
        write_jsonl(
            &config.paths.answers,
            &[answer("PAIR_99", "better_offense", "Team A")],
        )
        .unwrap();

        let result = Pipeline::new(config.clone()).run::<DefaultBackend>(Default::default());
        assert!(matches!(result, Err(OffenseError::Integrity { .. })));
        assert!(!Path::new(&config.paths.pairs).exists());
    }

    #[test]
    fn test_prompts_and_ask() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        seed_league(&config);
        let pipeline = Pipeline::new(config.clone());
        pipeline.pairs().unwrap();

        let prompts = pipeline.prompts().unwrap();
        assert_eq!(prompts.pairs, 8);
        assert_eq!(prompts.prompts, 16);

        let asked = pipeline.ask(&EchoJudge).unwrap();
        assert_eq!(asked.prompts, 16);
        assert_eq!(asked.failed, 8);

        let answers: Vec<AnswerRecord> = read_jsonl(&config.paths.answers).unwrap();
        assert_eq!(answers.len(), 16);
        let failed = answers.iter().find(|a| a.error.is_some()).unwrap();
        assert!(failed.answer.is_none());
        assert!(failed.is_type("style_comparison"));
    }

    /// Counts the answers already on disk each time it is asked
    struct CountingJudge {
        answers_path: String,
        on_disk: std::cell::RefCell<Vec<usize>>,
    }

    impl Judge for CountingJudge {
        fn ask(&self, _prompt: &str) -> Result<String> {
            let lines = fs::read_to_string(&self.answers_path)
                .map(|text| text.lines().count())
                .unwrap_or(0);
            self.on_disk.borrow_mut().push(lines);
            Ok("Team B".to_string())
        }
    }

    #[test]
    fn test_answers_written_as_they_arrive() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        seed_league(&config);
        let pipeline = Pipeline::new(config.clone());
        pipeline.pairs().unwrap();
        pipeline.prompts().unwrap();

        let judge = CountingJudge {
            answers_path: config.paths.answers.clone(),
            on_disk: std::cell::RefCell::new(Vec::new()),
        };
        pipeline.ask(&judge).unwrap();

        let on_disk = judge.on_disk.into_inner();
        assert_eq!(on_disk.len(), 16);
        assert_eq!(on_disk, (0..16).collect::<Vec<_>>());
    }

    #[test]
    fn test_summarize_from_plays() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        fs::write(
            &config.paths.plays,
            "GameId,OffenseTeam,Yards,IsRush,IsPass,IsTouchdown,IsPenalty\n\
             1,KC,10,1,0,0,0\n\
             1,KC,30,0,1,1,0\n\
             1,BUF,5,1,0,0,1\n\
             1,,0,0,0,0,0\n",
        )
        .unwrap();

        let summary = Pipeline::new(config.clone()).summarize().unwrap();
        assert_eq!(summary.plays, 4);
        assert_eq!(summary.teams, 2);

        let table = TeamTable::load(&config.paths.team_summary).unwrap();
        let kc = table.get("KC").unwrap();
        assert_eq!(kc.get(Metric::TotalYards), 40.0);
        assert_eq!(kc.get(Metric::Touchdowns), 1.0);
    }
}
