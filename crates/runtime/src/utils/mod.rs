mod hash;

pub use hash::actor_id_for;
