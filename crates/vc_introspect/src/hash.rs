//! Fixed-seed hashing for the lookup tables of this workspace.
//!
//! Property names and type ids are hashed with `foldhash` under a fixed
//! seed, so iteration-independent lookups are reproducible across runs.

use core::hash::BuildHasher;

use foldhash::fast::{FixedState, FoldHasher};

const FIXED_HASH_STATE: FixedState = FixedState::with_seed(0x5EED_B3A4_17C0_D0C5);

/// Hash state with a random but fixed seed.
///
/// # Examples
///
/// ```
/// use core::hash::BuildHasher;
/// use vc_introspect::hash::FixedHashState;
///
/// let a = FixedHashState.hash_one("name");
/// let b = FixedHashState.hash_one("name");
/// assert_eq!(a, b);
/// ```
#[derive(Copy, Clone, Default, Debug)]
pub struct FixedHashState;

impl BuildHasher for FixedHashState {
    type Hasher = FoldHasher<'static>;

    #[inline(always)]
    fn build_hasher(&self) -> Self::Hasher {
        FIXED_HASH_STATE.build_hasher()
    }
}

/// A [`hashbrown::HashMap`] using [`FixedHashState`].
pub type HashMap<K, V> = hashbrown::HashMap<K, V, FixedHashState>;

/// A [`hashbrown::HashSet`] using [`FixedHashState`].
pub type HashSet<T> = hashbrown::HashSet<T, FixedHashState>;
