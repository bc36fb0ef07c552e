//! Progressive reveal of a result page
//!
//! A [`Reveal`] hands out the products of one response, one per step, in
//! provider order. It carries the query generation it belongs to so the
//! session can drop steps that arrive after a newer query settled. Timing is
//! the session's concern.

use crate::backend::types::Product;

#[derive(Debug, Clone)]
pub struct Reveal {
    generation: u64,
    products: Vec<Product>,
    cursor: usize,
}

impl Reveal {
    pub fn new(generation: u64, products: Vec<Product>) -> Self {
        Self {
            generation,
            products,
            cursor: 0,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.products.len() - self.cursor
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.products.len()
    }
}

impl Iterator for Reveal {
    type Item = Product;

    fn next(&mut self) -> Option<Product> {
        let product = self.products.get(self.cursor).cloned()?;
        self.cursor += 1;
        Some(product)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining(), Some(self.remaining()))
    }
}

impl ExactSizeIterator for Reveal {}
