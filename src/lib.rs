// lib.rs
pub mod alignment_record;
pub mod bam;
pub mod faidx;
pub mod ipd;
pub mod kinetics;
pub mod seqidx;
pub mod store;
