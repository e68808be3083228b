//! Building bundle requests and reporting their results.

use nbdebug_daemon_types::{BundleRequest, BundleResult};
use tracing::info;

use super::snapshot::fetch_status_text;
use super::{DebugOptions, SessionError};
use crate::Console;
use crate::client::DaemonClient;

/// Assembles the daemon request; the upload URL is only sent when an upload
/// was asked for.
pub(crate) fn build_request(options: &DebugOptions, status: String) -> BundleRequest {
    BundleRequest {
        anonymize: options.anonymize,
        status,
        system_info: options.system_info,
        log_file_count: options.log_file_count,
        upload_url: options
            .upload_bundle
            .then(|| options.upload_url.clone()),
    }
}

pub(crate) async fn generate<C: DaemonClient>(
    client: &mut C,
    request: BundleRequest,
) -> Result<BundleResult, SessionError> {
    let result = client
        .debug_bundle(request)
        .await
        .map_err(SessionError::Bundle)?;
    info!(path = %result.path, "debug bundle created");
    Ok(result)
}

/// Prints where the bundle landed and, when requested, its upload key.
///
/// A non-empty upload failure reason is an error even when no upload was
/// requested.
pub(crate) fn report(
    result: &BundleResult,
    options: &DebugOptions,
    console: &Console,
) -> Result<(), SessionError> {
    console.println(format_args!("Local file:\n{}", result.path))?;

    if let Some(reason) = result.upload_failure() {
        return Err(SessionError::UploadFailed(reason.to_owned()));
    }

    if options.upload_bundle {
        let key = result.uploaded_key.as_deref().unwrap_or_default();
        console.println(format_args!("Upload file key:\n{key}"))?;
    }
    Ok(())
}

/// One-shot bundle: a single unlabelled status capture, then generate and
/// report.
pub(crate) async fn create_bundle<C: DaemonClient>(
    client: &mut C,
    options: &DebugOptions,
    console: &Console,
) -> Result<(), SessionError> {
    let status = fetch_status_text(client, options.anonymize, console).await?;
    let result = generate(client, build_request(options, status)).await?;
    report(&result, options, console)
}
