use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;

use crate::foundation::error::{SpreadError, SpreadResult};

/// Upstream directory holding the daily time-series tables.
pub const DEFAULT_BASE_URL: &str = "https://raw.githubusercontent.com/CSSEGISandData/COVID-19/master/csse_covid_19_data/csse_covid_19_time_series/";

/// The three fixed upstream tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DataFile {
    /// Cumulative confirmed cases.
    Confirmed,
    /// Cumulative deaths.
    Deaths,
    /// Cumulative recoveries.
    Recovered,
}

impl DataFile {
    /// Fetch order.
    pub const ALL: [DataFile; 3] = [DataFile::Confirmed, DataFile::Deaths, DataFile::Recovered];

    /// Upstream (and cached) file name.
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Confirmed => "time_series_19-covid-Confirmed.csv",
            Self::Deaths => "time_series_19-covid-Deaths.csv",
            Self::Recovered => "time_series_19-covid-Recovered.csv",
        }
    }

    /// Short label for logs.
    pub fn label(self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Deaths => "death",
            Self::Recovered => "recovered",
        }
    }

    /// Location of the cached copy inside `data_dir`.
    pub fn cached_path(self, data_dir: &Path) -> PathBuf {
        data_dir.join(self.file_name())
    }
}

/// Options for [`Fetcher`].
#[derive(Clone, Debug)]
pub struct FetchOpts {
    /// URL prefix the file names are appended to.
    pub base_url: String,
    /// Local cache directory.
    pub data_dir: PathBuf,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for FetchOpts {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            data_dir: PathBuf::from("data"),
            timeout: Duration::from_secs(60),
        }
    }
}

/// Result of fetching one table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The cached file was replaced with a fresh download.
    Downloaded {
        /// Size of the downloaded body.
        bytes: u64,
    },
    /// The download failed; the previous cached copy is used.
    KeptCached {
        /// Why the download was not used.
        reason: String,
    },
    /// The download failed and there is nothing cached.
    Missing {
        /// Why the download was not used.
        reason: String,
    },
}

/// Downloads the upstream tables into a local cache directory.
pub struct Fetcher {
    opts: FetchOpts,
    client: reqwest::blocking::Client,
}

impl Fetcher {
    /// Build a fetcher with a blocking HTTP client.
    pub fn new(opts: FetchOpts) -> SpreadResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(opts.timeout)
            .user_agent(concat!("spreadmap/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SpreadError::fetch(format!("build http client: {e}")))?;
        Ok(Self { opts, client })
    }

    /// URL `file` is downloaded from.
    pub fn url_for(&self, file: DataFile) -> String {
        let base = self.opts.base_url.trim_end_matches('/');
        format!("{base}/{}", file.file_name())
    }

    /// Fetch one table, replacing the cached copy only on HTTP 200.
    #[tracing::instrument(skip(self), fields(file = file.file_name()))]
    pub fn fetch(&self, file: DataFile) -> SpreadResult<FetchOutcome> {
        std::fs::create_dir_all(&self.opts.data_dir).with_context(|| {
            format!("create data dir '{}'", self.opts.data_dir.display())
        })?;
        let dest = file.cached_path(&self.opts.data_dir);

        let reason = match self.download(file) {
            Ok(body) => {
                write_replace(&dest, &body)?;
                return Ok(FetchOutcome::Downloaded {
                    bytes: body.len() as u64,
                });
            }
            Err(reason) => reason,
        };

        if dest.is_file() {
            tracing::warn!(
                reason = reason.as_str(),
                path = %dest.display(),
                "download failed, keeping cached copy"
            );
            Ok(FetchOutcome::KeptCached { reason })
        } else {
            tracing::warn!(reason = reason.as_str(), "download failed and no cached copy exists");
            Ok(FetchOutcome::Missing { reason })
        }
    }

    /// Fetch confirmed, deaths and recovered, in that order.
    pub fn fetch_all(&self) -> SpreadResult<Vec<(DataFile, FetchOutcome)>> {
        let mut out = Vec::with_capacity(DataFile::ALL.len());
        for file in DataFile::ALL {
            tracing::info!("fetching {} cases", file.label());
            let outcome = self.fetch(file)?;
            out.push((file, outcome));
        }
        Ok(out)
    }

    fn download(&self, file: DataFile) -> Result<Vec<u8>, String> {
        let url = self.url_for(file);
        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| format!("GET {url}: {e}"))?;
        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            return Err(format!("GET {url}: HTTP {status}"));
        }
        resp.bytes()
            .map(|b| b.to_vec())
            .map_err(|e| format!("read body of {url}: {e}"))
    }
}

fn write_replace(dest: &Path, body: &[u8]) -> SpreadResult<()> {
    let mut tmp = dest.as_os_str().to_owned();
    tmp.push(".part");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, body).with_context(|| format!("write '{}'", tmp.display()))?;
    std::fs::rename(&tmp, dest)
        .with_context(|| format!("move '{}' into place", dest.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/data/fetch.rs"]
mod tests;
