//! Reversible, salted short ids for secret gallery links.
//!
//! An id is written in base-N over an alphabet that is re-shuffled per id
//! from a "lottery" character and the salt, so consecutive ids do not look
//! consecutive. Short results are padded after a guard character, which
//! never appears in the alphabet.

use crate::config::SlugConfig;
use anyhow::{bail, Result};

const MIN_ALPHABET_LENGTH: usize = 16;
const GUARD_DIV: usize = 12;

#[derive(Debug, Clone)]
pub struct HashIds {
    salt: Vec<char>,
    alphabet: Vec<char>,
    guards: Vec<char>,
    min_length: usize,
}

impl HashIds {
    pub fn new(salt: &str, alphabet: &str, min_length: usize) -> Result<Self> {
        let mut unique: Vec<char> = Vec::new();
        for c in alphabet.chars() {
            if c.is_whitespace() {
                bail!("Slug alphabet may not contain whitespace");
            }
            if !unique.contains(&c) {
                unique.push(c);
            }
        }

        let salt: Vec<char> = salt.chars().collect();
        consistent_shuffle(&mut unique, &salt);

        let guard_count = unique.len().div_ceil(GUARD_DIV).max(1);
        if unique.len() < MIN_ALPHABET_LENGTH + guard_count {
            bail!(
                "Slug alphabet needs at least {} unique characters",
                MIN_ALPHABET_LENGTH + guard_count
            );
        }
        let guards = unique.drain(..guard_count).collect();

        Ok(Self {
            salt,
            alphabet: unique,
            guards,
            min_length,
        })
    }

    pub fn from_config(config: &SlugConfig) -> Result<Self> {
        Self::new(&config.salt, &config.alphabet, config.min_length)
    }

    pub fn encode(&self, id: u64) -> String {
        let len = self.alphabet.len();
        let lottery = self.alphabet[(id % 100) as usize % len];
        let alphabet = self.alphabet_for(lottery);

        let mut out: Vec<char> = Vec::with_capacity(self.min_length.max(12));
        out.push(lottery);
        out.extend(to_base(id, &alphabet));

        if out.len() < self.min_length {
            let index = (id % self.guards.len() as u64) as usize + out.len();
            let guard = self.guards[index % self.guards.len()];
            out.push(guard);

            let mut filler = alphabet.clone();
            while out.len() < self.min_length {
                let seed: Vec<char> = out.clone();
                consistent_shuffle(&mut filler, &seed);
                let needed = self.min_length - out.len();
                out.extend(filler.iter().take(needed));
            }
        }

        out.into_iter().collect()
    }

    /// Secret gallery path for an event. Negative ids have no slug.
    pub fn secret_path(&self, event_id: i64) -> Option<String> {
        u64::try_from(event_id)
            .ok()
            .map(|id| format!("/s/{}", self.encode(id)))
    }

    /// Returns the id behind `slug`, or `None` when it is not a slug this
    /// encoder would have produced.
    pub fn decode(&self, slug: &str) -> Option<u64> {
        let chars: Vec<char> = slug.chars().collect();
        let (&lottery, rest) = chars.split_first()?;
        if !self.alphabet.contains(&lottery) {
            return None;
        }

        let digits: Vec<char> = rest
            .iter()
            .take_while(|c| !self.guards.contains(c))
            .copied()
            .collect();
        if digits.is_empty() {
            return None;
        }

        let alphabet = self.alphabet_for(lottery);
        let id = from_base(&digits, &alphabet)?;

        if self.encode(id) == slug {
            Some(id)
        } else {
            None
        }
    }

    fn alphabet_for(&self, lottery: char) -> Vec<char> {
        let mut alphabet = self.alphabet.clone();
        let mut buffer: Vec<char> = Vec::with_capacity(1 + self.salt.len() + alphabet.len());
        buffer.push(lottery);
        buffer.extend(&self.salt);
        buffer.extend(&alphabet);
        buffer.truncate(alphabet.len());
        consistent_shuffle(&mut alphabet, &buffer);
        alphabet
    }
}

/// Deterministic in-place shuffle keyed by `salt`.
fn consistent_shuffle(alphabet: &mut [char], salt: &[char]) {
    if salt.is_empty() || alphabet.len() < 2 {
        return;
    }
    let mut v = 0usize;
    let mut p = 0usize;
    for i in (1..alphabet.len()).rev() {
        v %= salt.len();
        let n = salt[v] as usize;
        p += n;
        let j = (n + v + p) % i;
        alphabet.swap(i, j);
        v += 1;
    }
}

fn to_base(mut n: u64, alphabet: &[char]) -> Vec<char> {
    let base = alphabet.len() as u64;
    let mut digits = Vec::new();
    loop {
        digits.push(alphabet[(n % base) as usize]);
        n /= base;
        if n == 0 {
            break;
        }
    }
    digits.reverse();
    digits
}

fn from_base(digits: &[char], alphabet: &[char]) -> Option<u64> {
    let base = alphabet.len() as u64;
    digits.iter().try_fold(0u64, |acc, c| {
        let pos = alphabet.iter().position(|a| a == c)? as u64;
        acc.checked_mul(base)?.checked_add(pos)
    })
}
