//! Plate allocation state for one weekly batch.
//!
//! The allocator owns the ordered sample list of the current week and is
//! the only stateful part of the intake core. Indices, labels and primary
//! keys are assigned at insertion and never change afterwards; the only
//! mutation an existing record ever sees is a completion flag being set by
//! the artifact pipeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::error::{Result, SampleFlowError};
use crate::plate;

/// Completion flags the external artifact pipeline may set on a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionFlag {
    HasReferenceSeqZip,
    HasResultsZip,
    HasResultsFasta,
    HasResultsGbk,
}

/// A sample on the weekly plate. Identity fields (`index`, `label`,
/// `primary_key`) are fixed at allocation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sample {
    pub index: usize,
    pub label: String,
    pub primary_key: String,
    pub name: String,
    pub email: String,
    pub running_option: String,
    pub concentration: Option<i32>,
    pub date: NaiveDate,
    pub has_reference_seq_zip: bool,
    pub has_results_zip: bool,
    pub has_results_fasta: bool,
    pub has_results_gbk: bool,
}

impl Sample {
    fn set_flag(&mut self, flag: CompletionFlag) {
        match flag {
            CompletionFlag::HasReferenceSeqZip => self.has_reference_seq_zip = true,
            CompletionFlag::HasResultsZip => self.has_results_zip = true,
            CompletionFlag::HasResultsFasta => self.has_results_fasta = true,
            CompletionFlag::HasResultsGbk => self.has_results_gbk = true,
        }
    }

    /// Filename under which the submitter's reference sequences are
    /// archived by the pipeline.
    pub fn reference_seq_filename(&self) -> String {
        format!("{}_reference_sequence.zip", self.primary_key)
    }

    /// Filename of a generated result artifact ("zip", "fasta" or "gbk").
    pub fn results_filename(&self, filetype: &str) -> String {
        format!("{}.{}", self.primary_key, filetype)
    }
}

/// A validated submission, ready to be placed on the plate. Content
/// validation (name charset, email domain, running option) happens before
/// an instance of this reaches the allocator.
#[derive(Debug, Clone, Deserialize)]
pub struct Submission {
    pub name: String,
    pub email: String,
    // a missing option deserializes as "" and is rejected against the
    // configured enumeration, with the reason reported to the submitter
    #[serde(default)]
    pub running_option: String,
    #[serde(default)]
    pub concentration: Option<i32>,
}

/// Owns the ordered sample list of the current batch and hands out well
/// positions. One instance per batch; a new week means a new allocator.
#[derive(Debug)]
pub struct PlateAllocator {
    week: u32,
    n_rows: usize,
    n_cols: usize,
    samples: Vec<Sample>,
}

impl PlateAllocator {
    /// Creates an empty allocator for the given batch week. Fails on
    /// malformed plate settings rather than ever producing a bad label.
    pub fn new(week: u32, settings: &Settings) -> Result<PlateAllocator> {
        settings.validate()?;
        Ok(PlateAllocator {
            week,
            n_rows: settings.plate_n_rows,
            n_cols: settings.plate_n_cols,
            samples: Vec::new(),
        })
    }

    pub fn week(&self) -> u32 {
        self.week
    }

    pub fn capacity(&self) -> usize {
        self.n_rows * self.n_cols
    }

    /// Number of free wells left on the plate. Never negative.
    pub fn remaining(&self) -> usize {
        self.capacity() - self.samples.len()
    }

    pub fn is_full(&self) -> bool {
        self.remaining() == 0
    }

    /// Places a submission on the next free well and returns the stored
    /// record. The length check, label computation and append happen under
    /// one `&mut self` borrow, so two submissions can never observe the
    /// same index as long as callers serialize access to the allocator.
    ///
    /// Fails with `PlateFull` without touching any state if the plate has
    /// no free well left.
    pub fn add_sample(&mut self, submission: Submission, date: NaiveDate) -> Result<Sample> {
        if self.samples.len() >= self.capacity() {
            return Err(SampleFlowError::PlateFull);
        }
        let index = self.samples.len();
        let label = plate::compute_label(index, self.n_rows, self.n_cols)?;
        let primary_key = plate::get_primary_key(self.week, &label);
        debug!("Assigned well {} (key {}) to '{}'", label, primary_key, submission.name);
        let sample = Sample {
            index,
            label,
            primary_key,
            name: submission.name,
            email: submission.email,
            running_option: submission.running_option,
            concentration: submission.concentration,
            date,
            has_reference_seq_zip: false,
            has_results_zip: false,
            has_results_fasta: false,
            has_results_gbk: false,
        };
        self.samples.push(sample.clone());
        Ok(sample)
    }

    /// All samples submitted under the given address, in insertion order.
    /// Matching is exact and case-sensitive.
    pub fn get_samples(&self, email: &str) -> Vec<Sample> {
        self.samples
            .iter()
            .filter(|s| s.email == email)
            .cloned()
            .collect()
    }

    pub fn get_sample(&self, primary_key: &str) -> Option<&Sample> {
        self.samples.iter().find(|s| s.primary_key == primary_key)
    }

    /// Sets a completion flag on the record with the given primary key.
    /// Primary keys are never deleted, so an unknown key is a caller bug
    /// and not worth retrying.
    pub fn set_flag(&mut self, primary_key: &str, flag: CompletionFlag) -> Result<()> {
        match self.samples.iter_mut().find(|s| s.primary_key == primary_key) {
            Some(sample) => {
                sample.set_flag(flag);
                Ok(())
            }
            None => Err(SampleFlowError::UnknownPrimaryKey(primary_key.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(name: &str, email: &str) -> Submission {
        Submission {
            name: name.to_string(),
            email: email.to_string(),
            running_option: String::from("dna_r9.4.1_450bps_sup.cfg"),
            concentration: Some(120),
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 11, 2).unwrap()
    }

    fn allocator(week: u32) -> PlateAllocator {
        PlateAllocator::new(week, &Settings::default()).unwrap()
    }

    #[test]
    fn first_sample_gets_a1() {
        let mut alloc = allocator(1);
        let sample = alloc.add_sample(submission("foo", "x@embl.de"), date()).unwrap();
        assert_eq!(sample.index, 0);
        assert_eq!(sample.label, "A1");
        assert_eq!(sample.primary_key, "1_A1");
        assert!(!sample.has_reference_seq_zip);
        assert!(!sample.has_results_zip);
        assert!(!sample.has_results_fasta);
        assert!(!sample.has_results_gbk);
    }

    #[test]
    fn thirteenth_sample_wraps_to_second_row() {
        let mut alloc = allocator(1);
        for n in 0..12 {
            alloc
                .add_sample(submission(&format!("s{}", n), "x@embl.de"), date())
                .unwrap();
        }
        let sample = alloc.add_sample(submission("s12", "x@embl.de"), date()).unwrap();
        assert_eq!(sample.index, 12);
        assert_eq!(sample.label, "B1");
        assert_eq!(sample.primary_key, "1_B1");
    }

    #[test]
    fn remaining_decrements_only_on_success() {
        let mut alloc = allocator(1);
        assert_eq!(alloc.remaining(), 96);
        for n in 0..96 {
            assert_eq!(alloc.remaining(), 96 - n);
            alloc
                .add_sample(submission(&format!("s{}", n), "x@embl.de"), date())
                .unwrap();
        }
        assert_eq!(alloc.remaining(), 0);
        assert!(alloc.is_full());

        // the 97th submission is rejected and changes nothing
        let rejected = alloc.add_sample(submission("s96", "x@embl.de"), date());
        assert_eq!(rejected, Err(SampleFlowError::PlateFull));
        assert_eq!(alloc.remaining(), 0);
        assert_eq!(alloc.get_samples("x@embl.de").len(), 96);
    }

    #[test]
    fn get_samples_filters_and_keeps_order() {
        let mut alloc = allocator(7);
        alloc.add_sample(submission("a", "x@embl.de"), date()).unwrap();
        alloc.add_sample(submission("b", "y@dkfz.de"), date()).unwrap();
        alloc.add_sample(submission("c", "x@embl.de"), date()).unwrap();
        alloc.add_sample(submission("d", "X@embl.de"), date()).unwrap();

        let mine = alloc.get_samples("x@embl.de");
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].name, "a");
        assert_eq!(mine[1].name, "c");
        assert_eq!(mine[0].index, 0);
        assert_eq!(mine[1].index, 2);

        // exact match: case differences and unknown addresses yield nothing
        assert_eq!(alloc.get_samples("X@embl.de").len(), 1);
        assert!(alloc.get_samples("nobody@embl.de").is_empty());
    }

    #[test]
    fn set_flag_by_primary_key() {
        let mut alloc = allocator(3);
        let sample = alloc.add_sample(submission("foo", "x@embl.de"), date()).unwrap();
        assert_eq!(sample.primary_key, "3_A1");

        alloc.set_flag("3_A1", CompletionFlag::HasResultsZip).unwrap();
        alloc.set_flag("3_A1", CompletionFlag::HasResultsFasta).unwrap();
        let stored = alloc.get_sample("3_A1").unwrap();
        assert!(stored.has_results_zip);
        assert!(stored.has_results_fasta);
        assert!(!stored.has_results_gbk);
        assert!(!stored.has_reference_seq_zip);

        // identity fields are untouched by flag updates
        assert_eq!(stored.index, 0);
        assert_eq!(stored.label, "A1");
        assert_eq!(stored.primary_key, "3_A1");

        assert_eq!(
            alloc.set_flag("3_A2", CompletionFlag::HasResultsZip),
            Err(SampleFlowError::UnknownPrimaryKey(String::from("3_A2")))
        );
    }

    #[test]
    fn artifact_filenames_follow_the_key() {
        let mut alloc = allocator(42);
        let sample = alloc.add_sample(submission("foo", "x@embl.de"), date()).unwrap();
        assert_eq!(sample.reference_seq_filename(), "42_A1_reference_sequence.zip");
        assert_eq!(sample.results_filename("zip"), "42_A1.zip");
        assert_eq!(sample.results_filename("fasta"), "42_A1.fasta");
        assert_eq!(sample.results_filename("gbk"), "42_A1.gbk");
    }

    #[test]
    fn full_8_12_scenario() {
        let mut alloc = allocator(1);
        let first = alloc.add_sample(submission("foo", "x@embl.de"), date()).unwrap();
        assert_eq!((first.index, first.label.as_str(), first.primary_key.as_str()), (0, "A1", "1_A1"));
        for n in 1..12 {
            alloc
                .add_sample(submission(&format!("s{}", n), "x@embl.de"), date())
                .unwrap();
        }
        let thirteenth = alloc.add_sample(submission("s12", "x@embl.de"), date()).unwrap();
        assert_eq!(
            (thirteenth.index, thirteenth.label.as_str(), thirteenth.primary_key.as_str()),
            (12, "B1", "1_B1")
        );
        for n in 13..96 {
            alloc
                .add_sample(submission(&format!("s{}", n), "x@embl.de"), date())
                .unwrap();
        }
        assert_eq!(alloc.remaining(), 0);
        assert_eq!(
            alloc.add_sample(submission("overflow", "x@embl.de"), date()),
            Err(SampleFlowError::PlateFull)
        );
    }

    #[test]
    fn rejects_malformed_settings() {
        let mut settings = Settings::default();
        settings.plate_n_rows = 30;
        assert!(PlateAllocator::new(1, &settings).is_err());
        settings.plate_n_rows = 8;
        settings.plate_n_cols = 0;
        assert!(PlateAllocator::new(1, &settings).is_err());
    }
}
