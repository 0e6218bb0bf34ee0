/// Map presentation.
///
/// The page needs a map that can be re-centred on a box, show one marker per
/// earthquake, and reveal details for a marker when it is activated. The
/// marker list belongs to the map and only changes through `set_markers`,
/// which swaps the whole set at once.

use crate::model::{BoundingBox, Earthquake, QuakeDetail, TopTenResult};

/// What the page requires of a map widget.
pub trait MapView {
    /// Re-centre and zoom so `bbox` fills the view.
    fn set_view(&mut self, bbox: &BoundingBox);

    /// Replace every marker with one per earthquake.
    fn set_markers(&mut self, quakes: Vec<Earthquake>);

    /// Register the handler run when any marker is activated.
    fn on_activate(&mut self, callback: ActivateCallback);

    /// Activate the marker for `eqid`, returning its details if it is shown.
    fn activate(&mut self, eqid: &str) -> Option<QuakeDetail>;
}

// ---------------------------------------------------------------------------
// Marker layer
// ---------------------------------------------------------------------------

pub type ActivateCallback = Box<dyn FnMut(&QuakeDetail)>;

/// The current marker set plus the handler run when a marker is activated.
#[derive(Default)]
pub struct MarkerLayer {
    markers: Vec<Earthquake>,
    on_activate: Option<ActivateCallback>,
}

impl MarkerLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all markers and adds the new set in one step.
    pub(crate) fn replace_all(&mut self, quakes: Vec<Earthquake>) {
        self.markers = quakes;
    }

    pub fn markers(&self) -> &[Earthquake] {
        &self.markers
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Registers the handler shared by every marker; replaces any previous one.
    pub fn on_activate(&mut self, callback: ActivateCallback) {
        self.on_activate = Some(callback);
    }

    /// Activates the marker for `eqid`, running the handler with its details.
    ///
    /// Returns `None` if no current marker has that id.
    pub fn activate(&mut self, eqid: &str) -> Option<QuakeDetail> {
        let detail = self.markers.iter().find(|q| q.eqid == eqid)?.detail();
        if let Some(callback) = self.on_activate.as_mut() {
            callback(&detail);
        }
        Some(detail)
    }
}

// ---------------------------------------------------------------------------
// Terminal map
// ---------------------------------------------------------------------------

/// A `MapView` that renders to text.
#[derive(Default)]
pub struct ConsoleMap {
    view: Option<BoundingBox>,
    layer: MarkerLayer,
}

impl ConsoleMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> Option<&BoundingBox> {
        self.view.as_ref()
    }

    pub fn layer(&self) -> &MarkerLayer {
        &self.layer
    }

    pub fn render(&self) -> String {
        let mut out = String::new();

        match &self.view {
            Some(b) => out.push_str(&format!(
                "View: N {:.4}  S {:.4}  E {:.4}  W {:.4}\n",
                b.north, b.south, b.east, b.west
            )),
            None => out.push_str("View: whole world\n"),
        }

        if self.layer.is_empty() {
            out.push_str("No earthquakes in view.\n");
            return out;
        }

        out.push_str(&format!("{} earthquake(s):\n", self.layer.len()));
        for quake in self.layer.markers() {
            out.push_str(&format!(
                "  ● {:<12} M{:<4} ({:.3}, {:.3})  {}\n",
                quake.eqid, quake.magnitude, quake.lat, quake.lng, quake.datetime
            ));
        }
        out
    }
}

impl MapView for ConsoleMap {
    fn set_view(&mut self, bbox: &BoundingBox) {
        self.view = Some(*bbox);
    }

    fn set_markers(&mut self, quakes: Vec<Earthquake>) {
        self.layer.replace_all(quakes);
    }

    fn on_activate(&mut self, callback: ActivateCallback) {
        self.layer.on_activate(callback);
    }

    fn activate(&mut self, eqid: &str) -> Option<QuakeDetail> {
        self.layer.activate(eqid)
    }
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// Detail panel text for one earthquake.
pub fn format_detail(detail: &QuakeDetail) -> String {
    format!(
        "EQID: {}\nMagnitude: {}\nDepth: {}\nDate: {}\nLatitude: {}\nLongitude: {}",
        detail.eqid, detail.magnitude, detail.depth_km, detail.datetime, detail.lat, detail.lng
    )
}

/// Numbered "identifier - magnitude" rows for the top-ten panel.
pub fn format_top_ten(result: &TopTenResult) -> String {
    result
        .earthquakes
        .iter()
        .enumerate()
        .map(|(i, q)| format!("{:>2}. {} - {}", i + 1, q.eqid, q.magnitude))
        .collect::<Vec<_>>()
        .join("\n")
}
