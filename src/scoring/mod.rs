// Score math — pure, stateless functions.
//
// Everything here is deterministic on its inputs: no clock reads, no I/O.
// Callers pass the current time (or hours-old) explicitly so the pipeline
// and the tests compute identical scores.

pub mod engagement;
pub mod similarity;
pub mod topics;
