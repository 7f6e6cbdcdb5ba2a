// Output layer: renders results on stdout and shows an `indicatif` spinner
// on stderr while pages are fetched. The spinner hides itself when stderr
// is not a terminal, so piped output stays clean.

use crate::account::{list_keys, KeySet};
use crate::config::Arch;
use crate::error::{ApiError, Result};
use crate::instances::{format_instance, InstanceRecord};
use crate::marketplace::MarketplaceImage;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::time::Duration;
use tracing::error;

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// One fingerprint per line.
pub fn write_fingerprints<W: Write>(out: &mut W, keys: &KeySet) -> Result<()> {
    for fingerprint in list_keys(keys) {
        writeln!(out, "{fingerprint}")?;
    }
    Ok(())
}

/// Drain `servers` into `out`, one line per server. Lines written before an
/// error stay written. Returns the number of servers printed.
pub fn write_instances<W, I>(out: &mut W, servers: I) -> Result<usize>
where
    W: Write,
    I: IntoIterator<Item = Result<InstanceRecord>>,
{
    let spinner = spinner("Listing servers...");
    let mut count = 0;
    for server in servers {
        let server = match server {
            Ok(server) => server,
            Err(e) => {
                spinner.finish_and_clear();
                return Err(e);
            }
        };
        spinner.suspend(|| writeln!(out, "{}", format_instance(&server)))?;
        count += 1;
    }
    spinner.finish_and_clear();
    Ok(count)
}

/// Image header, then each version with the local image ids built for
/// `arch`.
pub fn write_image<W: Write>(out: &mut W, image: &MarketplaceImage, arch: Arch) -> Result<()> {
    writeln!(out, "Image {} - {}", image.id, image.name)?;
    for version in &image.versions {
        writeln!(out, "  Version identifier: {}", version.id)?;
        for local in version.local_images_for(arch) {
            writeln!(
                out,
                "    Image identifier for {} servers in {}: {}",
                local.arch, local.zone, local.id
            )?;
        }
    }
    Ok(())
}

/// Drain `images` into `out` behind a spinner. Returns the number of
/// images printed.
pub fn write_images<W, I>(out: &mut W, images: I, arch: Arch) -> Result<usize>
where
    W: Write,
    I: IntoIterator<Item = Result<MarketplaceImage>>,
{
    let spinner = spinner("Searching images...");
    let mut count = 0;
    for image in images {
        let image = match image {
            Ok(image) => image,
            Err(e) => {
                spinner.finish_and_clear();
                return Err(e);
            }
        };
        spinner.suspend(|| write_image(out, &image, arch))?;
        count += 1;
    }
    spinner.finish_and_clear();
    Ok(count)
}

/// Configuration and authentication errors are logged and end the process
/// with exit code 1; anything else is handed back to `main`.
pub fn exit_on_setup_error(result: anyhow::Result<()>) -> anyhow::Result<()> {
    if let Err(e) = &result {
        if e.downcast_ref::<ApiError>().is_some_and(ApiError::is_fatal_setup) {
            error!("{e:#}");
            std::process::exit(1);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::SshKeyRecord;

    #[test]
    fn fingerprints_one_per_line() {
        let keys = KeySet {
            ssh_public_keys: vec![
                SshKeyRecord {
                    key: "k1".into(),
                    fingerprint: "256 aa:bb one".into(),
                },
                SshKeyRecord {
                    key: "k2".into(),
                    fingerprint: "256 cc:dd two".into(),
                },
            ],
        };
        let mut out = Vec::new();
        write_fingerprints(&mut out, &keys).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "256 aa:bb one\n256 cc:dd two\n");
    }

    #[test]
    fn instances_stop_at_first_error() {
        let server = InstanceRecord {
            id: "a".into(),
            commercial_type: "DEV1-S".into(),
            name: "one".into(),
            state: "running".into(),
            public_ip: None,
            private_ip: None,
        };
        let items = vec![
            Ok(server.clone()),
            Err(ApiError::PaginationLimitExceeded(1)),
            Ok(server),
        ];
        let mut out = Vec::new();
        let err = write_instances(&mut out, items).unwrap_err();
        assert!(matches!(err, ApiError::PaginationLimitExceeded(1)));
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 1);
    }

    #[test]
    fn image_lists_matching_arch_only() {
        let image: MarketplaceImage = serde_json::from_value(serde_json::json!({
            "id": "img-1",
            "name": "Debian Buster",
            "versions": [{
                "id": "ver-1",
                "local_images": [
                    { "id": "l-1", "arch": "arm64", "zone": "par1" },
                    { "id": "l-2", "arch": "x86_64", "zone": "ams1" }
                ]
            }]
        }))
        .unwrap();
        let mut out = Vec::new();
        write_image(&mut out, &image, Arch::Arm64).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Image img-1 - Debian Buster\n  Version identifier: ver-1\n    Image identifier for arm64 servers in par1: l-1\n"
        );
    }
}
