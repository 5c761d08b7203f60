//! Headless player used by the binary and the tests
//!
//! Picks the next passenger to click the way a careful player would: feed the
//! front vehicle first, then any other visible vehicle, and only then guess.

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;

use super::session::Session;
use super::types::{ColorKey, PassengerId};

pub struct Autoplayer {
    rng: StdRng,
}

impl Default for Autoplayer {
    fn default() -> Self {
        Self::new()
    }
}

impl Autoplayer {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_rng(&mut rand::rng()),
        }
    }

    pub fn new_with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Choose a clickable passenger, or `None` if nothing can be clicked
    pub fn choose(&mut self, session: &Session) -> Option<PassengerId> {
        let clickable = session.clickable_passengers();
        if clickable.is_empty() {
            return None;
        }

        let wanted: Vec<&ColorKey> = session
            .vehicles()
            .visible_vehicles()
            .filter(|v| !v.is_full())
            .map(|v| &v.color)
            .collect();

        // Visible vehicles come front first, so the first color with a match wins
        for color in wanted {
            let matching = clickable.iter().copied().find(|id| {
                session
                    .passenger(*id)
                    .and_then(|p| p.visible_color())
                    .is_some_and(|c| c == color)
            });
            if matching.is_some() {
                return matching;
            }
        }

        clickable.choose(&mut self.rng).copied()
    }
}
