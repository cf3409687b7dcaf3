// src/utils/shuffle.rs

use rand::Rng;
use rand::seq::SliceRandom;

use crate::models::exam::Question;

/// A question in the order the student sees it.
///
/// `option_order[shown]` is the index of that option in the exam definition,
/// so answers can be mapped back before they are submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct PresentedQuestion {
    pub question: Question,
    pub option_order: Vec<usize>,
}

impl PresentedQuestion {
    fn unshuffled(question: Question) -> Self {
        let option_order = (0..question.options.len()).collect();
        Self {
            question,
            option_order,
        }
    }

    /// Original option index for a displayed one.
    pub fn original_index(&self, shown: usize) -> Option<usize> {
        self.option_order.get(shown).copied()
    }
}

/// Orders questions (and their options) for display.
pub fn present<R: Rng + ?Sized>(
    questions: &[Question],
    shuffle_questions: bool,
    shuffle_answers: bool,
    rng: &mut R,
) -> Vec<PresentedQuestion> {
    let mut presented: Vec<PresentedQuestion> = questions
        .iter()
        .cloned()
        .map(PresentedQuestion::unshuffled)
        .collect();

    if shuffle_questions {
        presented.shuffle(rng);
    }

    if shuffle_answers {
        for item in &mut presented {
            let mut paired: Vec<_> = item
                .option_order
                .iter()
                .copied()
                .zip(item.question.options.drain(..))
                .collect();
            paired.shuffle(rng);
            let (order, options): (Vec<_>, Vec<_>) = paired.into_iter().unzip();
            item.option_order = order;
            item.question.options = options;
        }
    }

    presented
}
