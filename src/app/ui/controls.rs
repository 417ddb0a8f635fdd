use std::collections::HashSet;
use std::sync::Arc;

use eframe::egui::{self, Ui};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use super::super::{SearchMatchCache, ViewModel};

const SEARCH_RESULT_ROWS: usize = 12;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

impl ViewModel {
    /// Node indices whose id or question fuzzily matches the search box.
    pub(in crate::app) fn cached_search_matches(&mut self) -> Option<Arc<HashSet<usize>>> {
        self.refresh_search_cache()
            .map(|cached| Arc::clone(&cached.matches))
    }

    /// Same matches as `cached_search_matches`, best first.
    pub(in crate::app) fn cached_search_ranking(&mut self) -> Option<Arc<Vec<usize>>> {
        self.refresh_search_cache()
            .map(|cached| Arc::clone(&cached.ranked))
    }

    fn refresh_search_cache(&mut self) -> Option<&SearchMatchCache> {
        let query = self.search.trim();
        if query.is_empty() {
            return None;
        }

        let stale = self
            .search_match_cache
            .as_ref()
            .is_none_or(|cached| cached.query != query);
        if stale {
            let ranked = self
                .ranked_matches(query)
                .into_iter()
                .map(|(index, _)| index)
                .collect::<Vec<_>>();
            let matches = ranked.iter().copied().collect::<HashSet<_>>();
            self.search_match_cache = Some(SearchMatchCache {
                query: query.to_owned(),
                ranked: Arc::new(ranked),
                matches: Arc::new(matches),
            });
        }
        self.search_match_cache.as_ref()
    }

    fn ranked_matches(&self, query: &str) -> Vec<(usize, i64)> {
        let matcher = SkimMatcherV2::default();
        let mut ranked = self
            .simulation
            .nodes()
            .iter()
            .enumerate()
            .filter_map(|(index, node)| {
                let by_label = node
                    .label
                    .as_deref()
                    .and_then(|label| fuzzy_match_score(&matcher, label, query));
                let by_id = fuzzy_match_score(&matcher, &node.id, query);
                by_label.max(by_id).map(|score| (index, score))
            })
            .collect::<Vec<_>>();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked
    }

    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Graph Controls");
        ui.separator();
        ui.add_space(4.0);

        ui.label("Search (market id or question)")
            .on_hover_text("Fuzzy-highlight matching markets without changing the layout.");
        ui.text_edit_singleline(&mut self.search);

        if let Some(ranked) = self.cached_search_ranking() {
            if ranked.is_empty() {
                ui.small("No markets match.");
            }
            for &index in ranked.iter().take(SEARCH_RESULT_ROWS) {
                let name = self.simulation.nodes()[index].display_name().to_owned();
                let selected = self.selected == Some(index);
                if ui.selectable_label(selected, name).clicked() {
                    self.selected = Some(index);
                }
            }
        }

        ui.separator();
        ui.label("Encoding");

        let mut log_radius = self.simulation.config().log_radius;
        if ui
            .checkbox(&mut log_radius, "Log-scaled node radius")
            .on_hover_text(
                "Connection counts are right-skewed; log scaling keeps small nodes apart.",
            )
            .changed()
        {
            self.simulation.set_log_radius(log_radius);
        }

        let opacity = &mut self.encoding.opacity;
        ui.add(egui::Slider::new(&mut opacity.exponent, 0.25..=4.0).text("Pressure exponent"))
            .on_hover_text("Values above 1 fade near-median pressure and keep extremes visible.");
        ui.add(egui::Slider::new(&mut opacity.min_opacity, 0.0..=1.0).text("Min edge opacity"));
        ui.add(egui::Slider::new(&mut opacity.max_opacity, 0.0..=1.0).text("Max edge opacity"));
        if opacity.max_opacity < opacity.min_opacity {
            opacity.max_opacity = opacity.min_opacity;
        }

        ui.separator();
        let report = self.simulation.bind_report();
        ui.small(format!(
            "Dropped while binding: {} duplicate markets, {} dangling connections",
            report.duplicate_nodes, report.dangling_edges
        ));
    }
}
