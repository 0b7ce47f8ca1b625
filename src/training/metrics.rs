//! Evaluation metrics on the held-out partition

use serde::{Deserialize, Serialize};
use std::fmt;

/// 2x2 counts indexed `[true class][predicted class]`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub counts: [[usize; 2]; 2],
}

impl ConfusionMatrix {
    pub fn from_predictions(truth: &[u8], predicted: &[u8]) -> Self {
        let mut counts = [[0usize; 2]; 2];
        for (&t, &p) in truth.iter().zip(predicted.iter()) {
            counts[t.min(1) as usize][p.min(1) as usize] += 1;
        }
        ConfusionMatrix { counts }
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn correct(&self) -> usize {
        self.counts[0][0] + self.counts[1][1]
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.correct(), self.total())
    }

    /// Rows of this class in the ground truth
    pub fn support(&self, class: usize) -> usize {
        self.counts[class].iter().sum()
    }

    /// Precision, recall, and F1 for one class; undefined ratios are 0
    pub fn class_scores(&self, class: usize) -> ClassScores {
        let tp = self.counts[class][class];
        let predicted = self.counts[0][class] + self.counts[1][class];
        let support = self.support(class);

        let precision = ratio(tp, predicted);
        let recall = ratio(tp, support);
        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };

        ClassScores {
            precision,
            recall,
            f1,
            support,
        }
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .counts
            .iter()
            .flatten()
            .map(|c| c.to_string().len())
            .max()
            .unwrap_or(1);
        let row = |r: &[usize; 2]| format!("{:>w$} {:>w$}", r[0], r[1], w = width);
        write!(f, "[[{}]\n [{}]]", row(&self.counts[0]), row(&self.counts[1]))
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassScores {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Scores for a set of predictions against the truth
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub accuracy: f64,
    pub confusion: ConfusionMatrix,
    /// Per class, index 0 = prefers Team B, 1 = prefers Team A
    pub classes: [ClassScores; 2],
    pub macro_avg: ClassScores,
    pub weighted_avg: ClassScores,
}

impl Evaluation {
    pub fn new(truth: &[u8], predicted: &[u8]) -> Self {
        let confusion = ConfusionMatrix::from_predictions(truth, predicted);
        let classes = [confusion.class_scores(0), confusion.class_scores(1)];
        let total = confusion.total();

        let average = |weight: &dyn Fn(&ClassScores) -> f64| {
            let sum_w: f64 = classes.iter().map(weight).sum();
            let avg = |get: fn(&ClassScores) -> f64| {
                if sum_w == 0.0 {
                    0.0
                } else {
                    classes.iter().map(|c| weight(c) * get(c)).sum::<f64>() / sum_w
                }
            };
            ClassScores {
                precision: avg(|c| c.precision),
                recall: avg(|c| c.recall),
                f1: avg(|c| c.f1),
                support: total,
            }
        };
        let macro_avg = average(&|_| 1.0);
        let weighted_avg = average(&|c| c.support as f64);

        Evaluation {
            accuracy: confusion.accuracy(),
            confusion,
            classes,
            macro_avg,
            weighted_avg,
        }
    }

    /// Text table in the layout of sklearn's `classification_report`
    pub fn classification_report(&self) -> String {
        let line = |name: &str, s: &ClassScores| {
            format!(
                "{:>12} {:>9.3} {:>9.3} {:>9.3} {:>9}\n",
                name, s.precision, s.recall, s.f1, s.support
            )
        };

        let mut out = format!(
            "{:>12} {:>9} {:>9} {:>9} {:>9}\n\n",
            "", "precision", "recall", "f1-score", "support"
        );
        for (class, scores) in self.classes.iter().enumerate() {
            out.push_str(&line(&class.to_string(), scores));
        }
        out.push('\n');
        out.push_str(&format!(
            "{:>12} {:>9} {:>9} {:>9.3} {:>9}\n",
            "accuracy",
            "",
            "",
            self.accuracy,
            self.confusion.total()
        ));
        out.push_str(&line("macro avg", &self.macro_avg));
        out.push_str(&line("weighted avg", &self.weighted_avg));
        out
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Acc: {:.2}% ({}/{}) | F1(A): {:.3} | F1(B): {:.3}",
            self.accuracy * 100.0,
            self.confusion.correct(),
            self.confusion.total(),
            self.classes[1].f1,
            self.classes[0].f1
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confusion_matrix() {
        let truth = [1, 1, 0, 0, 1];
        let predicted = [1, 0, 0, 1, 1];
        let cm = ConfusionMatrix::from_predictions(&truth, &predicted);

        assert_eq!(cm.counts, [[1, 1], [1, 2]]);
        assert_eq!(cm.total(), 5);
        assert!((cm.accuracy() - 0.6).abs() < 1e-12);
        assert_eq!(cm.to_string(), "[[1 1]\n [1 2]]");
    }

    #[test]
    fn test_class_scores() {
        let truth = [1, 1, 0, 0, 1];
        let predicted = [1, 0, 0, 1, 1];
        let eval = Evaluation::new(&truth, &predicted);

        let a = eval.classes[1];
        assert!((a.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((a.recall - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(a.support, 3);

        let b = eval.classes[0];
        assert!((b.precision - 0.5).abs() < 1e-12);
        assert!((b.recall - 0.5).abs() < 1e-12);

        assert!((eval.macro_avg.f1 - (2.0 / 3.0 + 0.5) / 2.0).abs() < 1e-12);
        assert!((eval.weighted_avg.recall - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_never_predicted_class_scores_zero() {
        let eval = Evaluation::new(&[0, 1], &[0, 0]);
        assert_eq!(eval.classes[1].precision, 0.0);
        assert_eq!(eval.classes[1].f1, 0.0);
        assert_eq!(eval.accuracy, 0.5);
    }

    #[test]
    fn test_report_layout() {
        let report = Evaluation::new(&[0, 1], &[0, 1]).classification_report();
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(
            lines[0],
            "             precision    recall  f1-score   support"
        );
        assert_eq!(
            lines[2],
            "           0     1.000     1.000     1.000         1"
        );
        assert!(lines[5].trim_start().starts_with("accuracy"));
        assert!(lines[7].trim_start().starts_with("weighted avg"));
    }
}
