//! Shared exit-code taxonomy for CLI collaborators.
//!
//! The core exposes the named codes; mapping errors onto them is the
//! caller's job.

use crate::diagnostics::{
    AppIdentityError, AssetError, ExportFailureReason, FulmenError, SchemaError,
};

/// Named process exit codes shared with the `fulmen` CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ExitCode {
    Success = 0,
    GeneralFailure = 1,
    InvalidArgument = 2,
    FileNotFound = 51,
    FileWriteFailed = 52,
    DataInvalid = 60,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Map a taxonomy error onto the exit-code set.
    pub fn from_error(error: &FulmenError) -> Self {
        match error {
            FulmenError::Asset(AssetError::NotFound { .. }) => ExitCode::FileNotFound,
            FulmenError::Asset(AssetError::InvalidId { .. }) => ExitCode::InvalidArgument,
            FulmenError::Asset(AssetError::Read { .. }) => ExitCode::FileNotFound,
            FulmenError::Asset(AssetError::Parse { .. }) => ExitCode::DataInvalid,
            FulmenError::Schema(SchemaError::NotFound { .. }) => ExitCode::FileNotFound,
            FulmenError::Schema(SchemaError::DataParse { .. }) => ExitCode::DataInvalid,
            FulmenError::Schema(SchemaError::MetaSchema { .. }) => ExitCode::DataInvalid,
            FulmenError::Schema(SchemaError::Parse { .. }) => ExitCode::DataInvalid,
            FulmenError::Schema(SchemaError::Export { reason, .. }) => match reason {
                ExportFailureReason::FileExists | ExportFailureReason::WriteFailed => {
                    ExitCode::FileWriteFailed
                }
                ExportFailureReason::InvalidFormat => ExitCode::InvalidArgument,
                ExportFailureReason::ProvenanceFailed | ExportFailureReason::Unknown => {
                    ExitCode::GeneralFailure
                }
            },
            FulmenError::Identity(AppIdentityError::NotFound { .. }) => ExitCode::FileNotFound,
            FulmenError::Identity(AppIdentityError::Read { .. }) => ExitCode::FileNotFound,
            FulmenError::Identity(AppIdentityError::Invalid { .. }) => ExitCode::DataInvalid,
            _ => ExitCode::GeneralFailure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset_id::AssetCategory;

    #[test]
    fn numeric_values_match_taxonomy() {
        assert_eq!(ExitCode::Success.code(), 0);
        assert_eq!(ExitCode::GeneralFailure.code(), 1);
        assert_eq!(ExitCode::InvalidArgument.code(), 2);
        assert_eq!(ExitCode::FileNotFound.code(), 51);
        assert_eq!(ExitCode::FileWriteFailed.code(), 52);
        assert_eq!(ExitCode::DataInvalid.code(), 60);
    }

    #[test]
    fn asset_not_found_maps_to_51() {
        let err = FulmenError::Asset(AssetError::NotFound {
            asset_id: "x".into(),
            category: AssetCategory::Docs,
            suggestions: vec![],
        });
        assert_eq!(ExitCode::from_error(&err), ExitCode::FileNotFound);
    }

    #[test]
    fn export_reasons_map_per_taxonomy() {
        let exists = FulmenError::Schema(SchemaError::Export {
            reason: ExportFailureReason::FileExists,
            out_path: None,
            source: None,
        });
        assert_eq!(ExitCode::from_error(&exists), ExitCode::FileWriteFailed);

        let format = FulmenError::Schema(SchemaError::Export {
            reason: ExportFailureReason::InvalidFormat,
            out_path: None,
            source: None,
        });
        assert_eq!(ExitCode::from_error(&format), ExitCode::InvalidArgument);

        let provenance = FulmenError::Schema(SchemaError::Export {
            reason: ExportFailureReason::ProvenanceFailed,
            out_path: None,
            source: None,
        });
        assert_eq!(ExitCode::from_error(&provenance), ExitCode::GeneralFailure);
    }

    #[test]
    fn invalid_identity_maps_to_60() {
        let err = FulmenError::Identity(AppIdentityError::Invalid {
            identity_path: None,
            diagnostics: vec![],
            source: None,
        });
        assert_eq!(ExitCode::from_error(&err), ExitCode::DataInvalid);
    }
}
