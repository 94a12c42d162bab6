//! Identity-preserving derived item lists.
//!
//! Cached columns and measured heights survive a props change only while the
//! derived list keeps its `Rc`. Transforms that pick items out of their input
//! go through [`DerivedItems`] so the same picks from the same input yield the
//! same list.

use std::rc::{Rc, Weak};

struct Picked<T> {
    input: Weak<[T]>,
    picks: Vec<usize>,
    output: Rc<[T]>,
}

/// Remembers the last list a transform produced.
///
/// The input is held weakly, so the memo never keeps an old host list alive,
/// and its allocation cannot be reused while the memo still points at it.
pub struct DerivedItems<T> {
    last: Option<Picked<T>>,
}

impl<T: Clone> DerivedItems<T> {
    pub fn new() -> Self {
        Self { last: None }
    }

    /// The items of `input` at `picks`, in that order.
    ///
    /// Returns `input` itself when `picks` is `0..input.len()`, and the list
    /// returned last time when the same input yields the same picks. Every
    /// pick must be in range.
    pub fn pick(&mut self, input: &Rc<[T]>, picks: Vec<usize>) -> Rc<[T]> {
        if is_identity(&picks, input.len()) {
            return Rc::clone(input);
        }
        if let Some(last) = &self.last {
            if last.picks == picks && Weak::ptr_eq(&last.input, &Rc::downgrade(input)) {
                return Rc::clone(&last.output);
            }
        }
        let output: Rc<[T]> = picks.iter().map(|&index| input[index].clone()).collect();
        self.last = Some(Picked {
            input: Rc::downgrade(input),
            picks,
            output: Rc::clone(&output),
        });
        output
    }

    /// Forgets the remembered list.
    pub fn clear(&mut self) {
        self.last = None;
    }
}

impl<T: Clone> Default for DerivedItems<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn is_identity(picks: &[usize], len: usize) -> bool {
    picks.len() == len && picks.iter().enumerate().all(|(slot, &index)| slot == index)
}
