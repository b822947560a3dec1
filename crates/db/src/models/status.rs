//! Status helper enums mapping to SMALLINT columns.
//!
//! Each enum variant's discriminant matches the seed data order (1-based)
//! used by the corresponding status column.

/// Status ID type matching SMALLINT in the database.
pub type StatusId = i16;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }
    };
}

define_status_enum! {
    /// Generation job lifecycle status.
    ///
    /// `Completed` and `Failed` are terminal: a terminal job is never
    /// mutated again, and reprocessing its id is a no-op.
    JobStatus {
        Queued = 1,
        Processing = 2,
        Completed = 3,
        Failed = 4,
    }
}

impl JobStatus {
    /// Whether this status is terminal.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// String representation for API responses.
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Map a raw status id back to the enum, if known.
    pub fn from_id(id: StatusId) -> Option<Self> {
        match id {
            1 => Some(JobStatus::Queued),
            2 => Some(JobStatus::Processing),
            3 => Some(JobStatus::Completed),
            4 => Some(JobStatus::Failed),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_status_ids_match_seed_data() {
        assert_eq!(JobStatus::Queued.id(), 1);
        assert_eq!(JobStatus::Processing.id(), 2);
        assert_eq!(JobStatus::Completed.id(), 3);
        assert_eq!(JobStatus::Failed.id(), 4);
    }

    #[test]
    fn terminal_statuses() {
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }

    #[test]
    fn from_id_round_trips() {
        for id in 1..=4 {
            assert_eq!(JobStatus::from_id(id).unwrap().id(), id);
        }
        assert!(JobStatus::from_id(9).is_none());
    }
}
