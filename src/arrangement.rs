//! Arrangement state: the live word order of a puzzle and the two player moves
//! that change it (drag-reorder and click-to-swap).
//!
//! Locked words never end a move anywhere but their pinned index, and at most
//! one word is selected at a time.

use crate::models::{Puzzle, Word};
use crate::{Error, Result};
use std::collections::HashMap;

impl Puzzle {
    /// Index of `word_id` in the solved order.
    pub fn correct_index(&self, word_id: u32) -> Option<usize> {
        self.original_words.iter().position(|w| w.id == word_id)
    }

    /// Current index of `word_id` in the scrambled order.
    pub fn position_of(&self, word_id: u32) -> Option<usize> {
        self.scrambled_words.iter().position(|w| w.id == word_id)
    }

    /// Token-level comparison, so interchangeable duplicates count as placed.
    pub fn is_correctly_placed(&self, index: usize) -> bool {
        match (self.scrambled_words.get(index), self.original_words.get(index)) {
            (Some(current), Some(expected)) => current.token == expected.token,
            _ => false,
        }
    }

    pub fn is_solved(&self) -> bool {
        (0..self.original_words.len()).all(|i| self.is_correctly_placed(i))
    }

    pub fn selected_word(&self) -> Option<&Word> {
        self.scrambled_words.iter().find(|w| w.selected)
    }

    /// Current arrangement joined with spaces.
    pub fn scrambled_text(&self) -> String {
        self.scrambled_words
            .iter()
            .map(|w| w.token.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Commit a full reordering proposed by a drag gesture.
    ///
    /// Only the ids of `new_order` are read; flags always come from the current
    /// arrangement. Locked words are swapped back onto their pinned indices
    /// before the order is committed.
    pub fn drag_reorder(&mut self, new_order: &[Word]) -> Result<()> {
        if new_order.len() != self.scrambled_words.len() {
            return Err(Error::InvalidMove(format!(
                "reorder has {} words, puzzle has {}",
                new_order.len(),
                self.scrambled_words.len()
            )));
        }

        let mut current: HashMap<u32, Word> = self
            .scrambled_words
            .iter()
            .map(|w| (w.id, w.clone()))
            .collect();
        let mut updated = Vec::with_capacity(new_order.len());
        for proposed in new_order {
            let word = current.remove(&proposed.id).ok_or_else(|| {
                Error::InvalidMove(format!(
                    "word {} is unknown or repeated in the reorder",
                    proposed.id
                ))
            })?;
            updated.push(word);
        }

        for (pinned, word) in self.scrambled_words.iter().enumerate() {
            if !word.locked {
                continue;
            }
            if let Some(moved_to) = updated.iter().position(|w| w.id == word.id) {
                if moved_to != pinned {
                    updated.swap(pinned, moved_to);
                }
            }
        }

        self.scrambled_words = updated;
        Ok(())
    }

    /// Click handler: the first click selects a word, the second swaps it with
    /// the clicked word and clears the selection. Locked words cannot take part
    /// in a swap; clicking one just drops the current selection.
    pub fn select_or_swap(&mut self, word_id: u32) -> Result<()> {
        let clicked = self
            .position_of(word_id)
            .ok_or_else(|| Error::InvalidMove(format!("unknown word id {}", word_id)))?;

        if self.scrambled_words[clicked].locked {
            self.clear_selection();
            return Ok(());
        }

        match self.scrambled_words.iter().position(|w| w.selected) {
            None => self.scrambled_words[clicked].selected = true,
            Some(selected) => {
                self.scrambled_words.swap(selected, clicked);
                self.clear_selection();
            }
        }
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        for word in &mut self.scrambled_words {
            word.selected = false;
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{ids, puzzle};
    use super::*;
    use crate::rng::{shuffle, RandomSource, StdRandom};

    fn reorder(puzzle: &Puzzle, order: &[u32]) -> Vec<Word> {
        order
            .iter()
            .map(|&id| {
                let index = puzzle.position_of(id).unwrap();
                puzzle.scrambled_words()[index].clone()
            })
            .collect()
    }

    #[test]
    fn test_drag_reorder_commits_new_order() {
        let mut p = puzzle(&["the", "cat", "sat"], &[2, 0, 1]);
        let proposal = reorder(&p, &[0, 1, 2]);
        p.drag_reorder(&proposal).unwrap();
        assert_eq!(ids(&p), vec![0, 1, 2]);
        assert!(p.is_solved());
    }

    #[test]
    fn test_drag_reorder_repins_locked_word() {
        let mut p = puzzle(&["a", "b", "c", "d"], &[0, 3, 1, 2]);
        p.scrambled_words[0].locked = true;

        let proposal = reorder(&p, &[3, 1, 0, 2]);
        p.drag_reorder(&proposal).unwrap();

        assert_eq!(ids(&p)[0], 0);
        assert_eq!(ids(&p), vec![0, 1, 3, 2]);
        assert!(p.scrambled_words[0].locked);
    }

    #[test]
    fn test_drag_reorder_repins_multiple_locked_words() {
        let mut p = puzzle(&["a", "b", "c", "d", "e"], &[0, 4, 2, 1, 3]);
        p.scrambled_words[0].locked = true;
        p.scrambled_words[2].locked = true;

        let proposal = reorder(&p, &[2, 0, 4, 1, 3]);
        p.drag_reorder(&proposal).unwrap();

        assert_eq!(ids(&p)[0], 0);
        assert_eq!(ids(&p)[2], 2);
    }

    #[test]
    fn test_drag_reorder_keeps_current_flags() {
        let mut p = puzzle(&["a", "b", "c"], &[2, 1, 0]);
        p.scrambled_words[1].locked = true;

        let mut proposal = reorder(&p, &[0, 1, 2]);
        for word in &mut proposal {
            word.locked = false;
        }
        p.drag_reorder(&proposal).unwrap();
        let b = p.position_of(1).unwrap();
        assert!(p.scrambled_words[b].locked);
    }

    #[test]
    fn test_drag_reorder_rejects_non_permutation() {
        let mut p = puzzle(&["a", "b", "c"], &[2, 1, 0]);
        let before = ids(&p);

        let duplicated = reorder(&p, &[0, 0, 1]);
        assert!(matches!(p.drag_reorder(&duplicated), Err(Error::InvalidMove(_))));

        let short = reorder(&p, &[0, 1]);
        assert!(matches!(p.drag_reorder(&short), Err(Error::InvalidMove(_))));

        assert_eq!(ids(&p), before);
    }

    #[test]
    fn test_select_then_swap() {
        let mut p = puzzle(&["a", "b", "c"], &[2, 1, 0]);

        p.select_or_swap(2).unwrap();
        assert_eq!(p.selected_word().map(|w| w.id), Some(2));

        p.select_or_swap(0).unwrap();
        assert_eq!(ids(&p), vec![0, 1, 2]);
        assert!(p.selected_word().is_none());
    }

    #[test]
    fn test_clicking_selected_word_deselects() {
        let mut p = puzzle(&["a", "b"], &[1, 0]);
        p.select_or_swap(1).unwrap();
        p.select_or_swap(1).unwrap();
        assert_eq!(ids(&p), vec![1, 0]);
        assert!(p.selected_word().is_none());
    }

    #[test]
    fn test_locked_word_cannot_be_swapped() {
        let mut p = puzzle(&["a", "b", "c"], &[0, 2, 1]);
        p.scrambled_words[0].locked = true;

        p.select_or_swap(0).unwrap();
        assert!(p.selected_word().is_none());

        p.select_or_swap(2).unwrap();
        p.select_or_swap(0).unwrap();
        assert_eq!(ids(&p), vec![0, 2, 1]);
        assert!(p.selected_word().is_none());
    }

    #[test]
    fn test_select_unknown_word_is_rejected() {
        let mut p = puzzle(&["a", "b"], &[1, 0]);
        assert!(matches!(p.select_or_swap(9), Err(Error::InvalidMove(_))));
    }

    #[test]
    fn test_duplicate_tokens_count_as_solved() {
        let p = puzzle(&["the", "dog", "saw", "the", "cat"], &[3, 1, 2, 0, 4]);
        assert!(p.is_solved());
    }

    #[test]
    fn test_random_moves_preserve_invariants() {
        let mut rng = StdRandom::seeded(11);
        let tokens = ["one", "two", "three", "four", "five", "six"];
        let mut p = puzzle(&tokens, &[5, 2, 1, 3, 0, 4]);
        p.scrambled_words[3].locked = true;
        let locked_id = p.scrambled_words[3].id;

        for step in 0..500 {
            if step % 2 == 0 {
                let mut order: Vec<u32> = ids(&p);
                shuffle(&mut rng, &mut order);
                let proposal = reorder(&p, &order);
                p.drag_reorder(&proposal).unwrap();
            } else {
                let id = rng.index(tokens.len()) as u32;
                p.select_or_swap(id).unwrap();
            }

            assert_eq!(p.position_of(locked_id), Some(3));
            assert!(p.scrambled_words().iter().filter(|w| w.selected).count() <= 1);
            let mut sorted = ids(&p);
            sorted.sort();
            assert_eq!(sorted, vec![0, 1, 2, 3, 4, 5]);
        }
    }
}
