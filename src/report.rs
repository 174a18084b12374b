// Report driver: address, site and group sections rendered from the store.
// One row per directory entry, stable-sorted by label, so the same store and directory
// snapshot always produce the same bytes.

use std::fmt;
use std::io::Write;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::aggregation;
use crate::directory::DirectorySnapshot;
use crate::models::{Group, Site};
use crate::render::{Dialect, Projection, render, render_placeholder};
use crate::store::{SeriesStore, StoreView};

/// Label column widths in the space dialect.
const ADDRESS_WIDTH: usize = 15;
const SITE_WIDTH: usize = 25;
const GROUP_WIDTH: usize = 20;

/// Site with no canonical address configured.
pub const NO_ADDRESS: &str = "no-address";
/// Site address with no series in the store.
pub const NO_DATA: &str = "no-data";
/// Group with no member addresses.
pub const NO_MEMBERS: &str = "no-members";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Address,
    Site,
    Group,
    All,
}

impl ReportKind {
    pub fn needs_sites(self) -> bool {
        matches!(self, ReportKind::Site | ReportKind::All)
    }

    pub fn needs_groups(self) -> bool {
        matches!(self, ReportKind::Group | ReportKind::All)
    }

    fn sections(self) -> &'static [Section] {
        match self {
            ReportKind::Address => &[Section::Address],
            ReportKind::Site => &[Section::Site],
            ReportKind::Group => &[Section::Group],
            ReportKind::All => &[Section::Address, Section::Site, Section::Group],
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReportKind::Address => "address",
            ReportKind::Site => "site",
            ReportKind::Group => "group",
            ReportKind::All => "all",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Address,
    Site,
    Group,
}

impl Section {
    fn name(self) -> &'static str {
        match self {
            Section::Address => "address",
            Section::Site => "site",
            Section::Group => "group",
        }
    }
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("write report: {0}")]
    Io(#[from] std::io::Error),
}

/// Orders rows by label. Stable, so entries sharing a label keep directory order.
fn sorted_lines(mut rows: Vec<(String, String)>) -> Vec<String> {
    rows.sort_by(|a, b| a.0.cmp(&b.0));
    rows.into_iter().map(|(_, line)| line).collect()
}

/// Section header, e.g. `-------- site band data(in) --------`.
pub fn header(section: &str, projection: Projection) -> String {
    format!("-------- {section} band data({projection}) --------")
}

/// Renders report sections over one store with a fixed dialect and projection.
pub struct Reporter<'a> {
    store: &'a SeriesStore,
    dialect: Dialect,
    projection: Projection,
}

impl<'a> Reporter<'a> {
    pub fn new(store: &'a SeriesStore, dialect: Dialect, projection: Projection) -> Self {
        Self {
            store,
            dialect,
            projection,
        }
    }

    /// One row per address in the store, full history, no aggregation.
    pub fn address_report(&self) -> Vec<String> {
        let view = self.store.view();
        let rows = view
            .keys()
            .into_iter()
            .map(|address| {
                let line = render(
                    self.dialect,
                    &address,
                    ADDRESS_WIDTH,
                    view.full_range(&address),
                    self.projection,
                );
                (address, line)
            })
            .collect();
        sorted_lines(rows)
    }

    /// One row per site: its canonical address's series, or a placeholder.
    pub fn site_report(&self, sites: &[Site]) -> Vec<String> {
        let view = self.store.view();
        let rows = sites
            .iter()
            .map(|site| {
                let label = site.label();
                let line = self.site_row(&view, site, &label);
                (label, line)
            })
            .collect();
        sorted_lines(rows)
    }

    fn site_row(&self, view: &StoreView<'_>, site: &Site, label: &str) -> String {
        let Some(address) = site.address.as_deref() else {
            return render_placeholder(self.dialect, label, SITE_WIDTH, NO_ADDRESS);
        };
        match view.series(address) {
            Some(series) => render(
                self.dialect,
                label,
                SITE_WIDTH,
                series.as_slice(),
                self.projection,
            ),
            None => render_placeholder(self.dialect, label, SITE_WIDTH, NO_DATA),
        }
    }

    /// One row per group: member series summed by exact timestamp.
    pub fn group_report(&self, groups: &[Group]) -> Vec<String> {
        let view = self.store.view();
        let rows = groups
            .iter()
            .map(|group| {
                let label = group.label();
                let line = self.group_row(&view, group, &label);
                (label, line)
            })
            .collect();
        sorted_lines(rows)
    }

    fn group_row(&self, view: &StoreView<'_>, group: &Group, label: &str) -> String {
        if group.members.is_empty() {
            return render_placeholder(self.dialect, label, GROUP_WIDTH, NO_MEMBERS);
        }
        let missing = group
            .members
            .iter()
            .filter(|m| !view.contains(m.as_str()))
            .count();
        if missing > 0 {
            debug!(group = label, missing, "group members without data");
        }
        let merged = aggregation::merge(group.members.iter().map(|m| view.full_range(m)));
        render(
            self.dialect,
            label,
            GROUP_WIDTH,
            &merged,
            self.projection,
        )
    }

    fn section_lines(&self, section: Section, directory: &DirectorySnapshot) -> Vec<String> {
        match section {
            Section::Address => self.address_report(),
            Section::Site => self.site_report(&directory.sites),
            Section::Group => self.group_report(&directory.groups),
        }
    }

    /// Writes every section of `kind`, each preceded by its header.
    #[instrument(skip(self, directory, out), fields(dialect = ?self.dialect, projection = %self.projection))]
    pub fn write<W: Write>(
        &self,
        kind: ReportKind,
        directory: &DirectorySnapshot,
        out: &mut W,
    ) -> Result<(), ReportError> {
        for &section in kind.sections() {
            let lines = self.section_lines(section, directory);
            writeln!(out, "{}", header(section.name(), self.projection))?;
            for line in &lines {
                writeln!(out, "{line}")?;
            }
            debug!(section = section.name(), rows = lines.len(), "section written");
        }
        out.flush()?;
        Ok(())
    }
}
