use std::collections::BTreeMap;
use std::fmt;

/// Label-wise counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LabelMeasure {
    /// Number of correct predictions.
    pub n_correct: usize,

    /// Number of occurrences of the label in the reference.
    pub n_observations: usize,

    /// Number of predictions of the label.
    pub n_predictions: usize,
}

impl LabelMeasure {
    pub fn precision(&self) -> f64 {
        if self.n_predictions == 0 {
            0.0
        } else {
            self.n_correct as f64 / self.n_predictions as f64
        }
    }

    pub fn recall(&self) -> f64 {
        if self.n_observations == 0 {
            0.0
        } else {
            self.n_correct as f64 / self.n_observations as f64
        }
    }

    pub fn f1(&self) -> f64 {
        let precision = self.precision();
        let recall = self.recall();
        if precision + recall > 0.0 {
            2. * precision * recall / (precision + recall)
        } else {
            0.0
        }
    }
}

/// Accumulates tagging accuracy against a reference.
///
/// # Examples
///
/// ```
/// use perceptag::Evaluation;
///
/// let mut evaluation = Evaluation::default();
/// evaluation.accumulate(&["DT", "NN"], &["DT", "VB"]);
/// assert_eq!(0.5, evaluation.item_accuracy());
/// assert_eq!(0.0, evaluation.sentence_accuracy());
/// ```
#[derive(Clone, Debug, Default)]
pub struct Evaluation {
    // Uses BTreeMap to print labels in a stable order.
    labels: BTreeMap<String, LabelMeasure>,
    n_items: usize,
    n_correct_items: usize,
    n_sentences: usize,
    n_correct_sentences: usize,
}

impl Evaluation {
    /// Adds one sentence.
    ///
    /// Pairs are compared position by position. If the lengths differ, the surplus of the
    /// longer side is counted as unmatched observations or predictions.
    pub fn accumulate<R, P>(&mut self, reference: &[R], prediction: &[P])
    where
        R: AsRef<str>,
        P: AsRef<str>,
    {
        let mut matched = reference.len() == prediction.len();
        for (i, r) in reference.iter().enumerate() {
            let r: &str = r.as_ref();
            self.labels.entry(r.to_string()).or_default().n_observations += 1;
            self.n_items += 1;
            let Some(p) = prediction.get(i) else {
                matched = false;
                continue;
            };
            let p: &str = p.as_ref();
            self.labels.entry(p.to_string()).or_default().n_predictions += 1;
            if r == p {
                self.labels.entry(r.to_string()).or_default().n_correct += 1;
                self.n_correct_items += 1;
            } else {
                matched = false;
            }
        }
        for p in prediction.iter().skip(reference.len()) {
            self.labels
                .entry(p.as_ref().to_string())
                .or_default()
                .n_predictions += 1;
        }
        self.n_sentences += 1;
        if matched {
            self.n_correct_sentences += 1;
        }
    }

    pub fn label(&self, label: &str) -> Option<&LabelMeasure> {
        self.labels.get(label)
    }

    pub fn item_accuracy(&self) -> f64 {
        if self.n_items == 0 {
            0.0
        } else {
            self.n_correct_items as f64 / self.n_items as f64
        }
    }

    pub fn sentence_accuracy(&self) -> f64 {
        if self.n_sentences == 0 {
            0.0
        } else {
            self.n_correct_sentences as f64 / self.n_sentences as f64
        }
    }

    /// Macro-averaged precision, recall and F1 over labels seen in the reference.
    pub fn macro_average(&self) -> (f64, f64, f64) {
        let mut n = 0u32;
        let mut precision = 0.0;
        let mut recall = 0.0;
        let mut f1 = 0.0;
        for lev in self.labels.values().filter(|lev| lev.n_observations > 0) {
            n += 1;
            precision += lev.precision();
            recall += lev.recall();
            f1 += lev.f1();
        }
        if n == 0 {
            return (0.0, 0.0, 0.0);
        }
        let n = f64::from(n);
        (precision / n, recall / n, f1 / n)
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "Performance by label (#match, #model, #ref) (precision, recall, F1):"
        )?;
        for (label, lev) in &self.labels {
            if lev.n_observations == 0 {
                writeln!(
                    f,
                    "\t{}: ({}, {}, {}) (******, ******, ******)",
                    label, lev.n_correct, lev.n_predictions, lev.n_observations,
                )?;
            } else {
                writeln!(
                    f,
                    "\t{}: ({}, {}, {}) ({:.4}, {:.4}, {:.4})",
                    label,
                    lev.n_correct,
                    lev.n_predictions,
                    lev.n_observations,
                    lev.precision(),
                    lev.recall(),
                    lev.f1(),
                )?;
            }
        }
        let (precision, recall, f1) = self.macro_average();
        writeln!(
            f,
            "Macro-average precision, recall, F1: ({precision:.4}, {recall:.4}, {f1:.4})"
        )?;
        writeln!(
            f,
            "Item accuracy: {}/{} => {:.4}",
            self.n_correct_items,
            self.n_items,
            self.item_accuracy(),
        )?;
        write!(
            f,
            "Sentence accuracy: {}/{} => {:.4}",
            self.n_correct_sentences,
            self.n_sentences,
            self.sentence_accuracy(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulate_counts() {
        let mut evaluation = Evaluation::default();
        evaluation.accumulate(&["DT", "NN", "VB"], &["DT", "NN", "NN"]);
        evaluation.accumulate(&["PRP", "VB"], &["PRP", "VB"]);

        assert_eq!(0.8, evaluation.item_accuracy());
        assert_eq!(0.5, evaluation.sentence_accuracy());
        assert_eq!(
            Some(&LabelMeasure {
                n_correct: 1,
                n_observations: 1,
                n_predictions: 2,
            }),
            evaluation.label("NN")
        );
        assert_eq!(
            Some(&LabelMeasure {
                n_correct: 1,
                n_observations: 2,
                n_predictions: 1,
            }),
            evaluation.label("VB")
        );
    }

    #[test]
    fn test_label_measure() {
        let lev = LabelMeasure {
            n_correct: 1,
            n_observations: 2,
            n_predictions: 4,
        };

        assert_eq!(0.25, lev.precision());
        assert_eq!(0.5, lev.recall());
        assert!((lev.f1() - 1. / 3.).abs() < 1e-12);
        assert_eq!(0.0, LabelMeasure::default().f1());
    }

    #[test]
    fn test_length_mismatch() {
        let mut evaluation = Evaluation::default();
        evaluation.accumulate(&["DT", "NN"], &["DT"]);
        evaluation.accumulate(&["DT"], &["DT", "UNRESOLVED"]);

        assert_eq!(2. / 3., evaluation.item_accuracy());
        assert_eq!(0.0, evaluation.sentence_accuracy());
        assert_eq!(1, evaluation.label("UNRESOLVED").unwrap().n_predictions);
        assert_eq!(0, evaluation.label("UNRESOLVED").unwrap().n_observations);
    }

    #[test]
    fn test_macro_average_ignores_unobserved() {
        let mut evaluation = Evaluation::default();
        evaluation.accumulate(&["DT", "DT"], &["DT", "XX"]);

        // DT: precision 1, recall 0.5. XX is never observed.
        let (precision, recall, _) = evaluation.macro_average();
        assert_eq!(1.0, precision);
        assert_eq!(0.5, recall);
    }

    #[test]
    fn test_empty() {
        let evaluation = Evaluation::default();

        assert_eq!(0.0, evaluation.item_accuracy());
        assert_eq!(0.0, evaluation.sentence_accuracy());
        assert_eq!((0.0, 0.0, 0.0), evaluation.macro_average());
    }

    #[test]
    fn test_display() {
        let mut evaluation = Evaluation::default();
        evaluation.accumulate(&["DT", "NN"], &["DT", "XX"]);

        let expected = "\
Performance by label (#match, #model, #ref) (precision, recall, F1):
\tDT: (1, 1, 1) (1.0000, 1.0000, 1.0000)
\tNN: (0, 0, 1) (0.0000, 0.0000, 0.0000)
\tXX: (0, 1, 0) (******, ******, ******)
Macro-average precision, recall, F1: (0.5000, 0.5000, 0.5000)
Item accuracy: 1/2 => 0.5000
Sentence accuracy: 0/1 => 0.0000";
        assert_eq!(expected, evaluation.to_string());
    }
}
