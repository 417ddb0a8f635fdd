use eframe::egui::{RichText, Ui};
use market_graph::encode::opacity_of;
use market_graph::util::format_volume;

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Selection Details");
        ui.add_space(6.0);

        let Some(index) = self.selected.or(self.hovered) else {
            ui.label("Select a market on the canvas or from the search results.");
            return;
        };
        let Some(node) = self.simulation.nodes().get(index) else {
            ui.label("Selected market no longer exists in the layout.");
            return;
        };

        ui.label(RichText::new(node.display_name()).strong());
        if node.label.is_some() {
            ui.small(node.id.as_str());
        }
        ui.add_space(6.0);

        let thresholds = &self.thresholds.volatility;
        let tier = self
            .frame
            .nodes
            .get(index)
            .map(|visual| visual.tier.label())
            .unwrap_or("n/a");
        ui.label(format!("Volatility: {:.3} ({tier})", node.volatility));
        ui.small(format!(
            "p40 {:.3}  p60 {:.3}  p80 {:.3}  max {:.3}",
            thresholds.p40, thresholds.p60, thresholds.p80, thresholds.max
        ));
        ui.label(format!("Volume: {}", format_volume(node.volume)));
        ui.label(format!("Connections: {}", node.connection_count));
        ui.label(format!(
            "Position: ({:.1}, {:.1})",
            node.position.x, node.position.y
        ));

        ui.separator();
        ui.label(RichText::new("Connections").strong());
        let nodes = self.simulation.nodes();
        let mut neighbours = self
            .simulation
            .connections()
            .iter()
            .filter_map(|connection| {
                let (source, target) = connection.indices()?;
                let other = if source == index {
                    target
                } else if target == index {
                    source
                } else {
                    return None;
                };
                Some((other, connection.correlation, connection.pressure))
            })
            .collect::<Vec<_>>();
        if neighbours.is_empty() {
            ui.label("No bound connections.");
            return;
        }

        neighbours.sort_by(|a, b| b.2.total_cmp(&a.2));
        let mut next_selection = None;
        for (other, correlation, pressure) in neighbours {
            let opacity = opacity_of(pressure, &self.thresholds.pressure, &self.encoding.opacity);
            let text = format!(
                "{}  |  corr {correlation:.2}  |  pressure {pressure:.2} ({:.0}%)",
                nodes[other].display_name(),
                opacity * 100.0
            );
            if ui.selectable_label(false, text).clicked() {
                next_selection = Some(other);
            }
        }
        if next_selection.is_some() {
            self.selected = next_selection;
        }
    }
}
