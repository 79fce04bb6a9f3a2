//! Hashrate and worker extraction over rendered dashboard HTML.
//!
//! Extraction is layered: each [`HashrateStrategy`] is tried in order and the
//! first non-empty value wins. Lookups never fail; a miss is simply `None`.

use crate::models::watcher::Reading;
use log::debug;
use regex::Regex;
use scraper::node::Element;
use scraper::{ElementRef, Html, Node};
use std::sync::LazyLock;

/// 数字（可含任意 `.` `,` 分隔符，允许省略整数位）+ 可选单位前缀 + H/s
static HASH_RATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.?\d[\d.,]*\s*[KMGTPE]?H/s").expect("valid hash rate pattern"));

static WORKERS_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Workers?").expect("valid workers pattern"));

// 由具体到宽泛
static HASHRATE_LABELS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("24h-average-hashrate", r"(?i)24\s*H(our)?\s*(Avg\.?|Average)?\s*Hashrate"),
        ("24h-hashrate", r"(?i)24H\s*Hashrate"),
        ("average-hashrate", r"(?i)Average\s*Hashrate"),
        ("24h", r"(?i)24H"),
    ]
    .into_iter()
    .map(|(name, pattern)| (name, Regex::new(pattern).expect("valid label pattern")))
    .collect()
});

const HIDDEN_TAGS: &[&str] = &["head", "script", "style", "noscript", "template", "svg"];

/// First hash rate value (number plus unit) found in `text`.
pub fn find_hash_rate(text: &str) -> Option<&str> {
    HASH_RATE
        .find(text)
        .map(|m| m.as_str().trim())
        .filter(|value| !value.is_empty())
}

/// One layer of the hashrate lookup.
pub trait HashrateStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn find(&self, document: &Html) -> Option<String>;
}

/// 定位文字标签，再在标签附近查找算力数值
pub struct LabelStrategy {
    name: &'static str,
    label: Regex,
}

impl LabelStrategy {
    pub fn new(name: &'static str, label: Regex) -> Self {
        Self { name, label }
    }
}

impl HashrateStrategy for LabelStrategy {
    fn name(&self) -> &'static str {
        self.name
    }

    fn find(&self, document: &Html) -> Option<String> {
        let label = find_label(document, &self.label)?;

        // 标签自身 -> 后续兄弟元素 -> 父元素
        let siblings = label
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .filter(|el| !is_hidden_element(el.value()));
        let parent = label.parent().and_then(ElementRef::wrap);

        std::iter::once(label)
            .chain(siblings)
            .chain(parent)
            .find_map(|scope| find_hash_rate(&visible_text(scope)).map(str::to_string))
    }
}

/// Whole-page fallback: first hash rate anywhere in the visible body text.
pub struct PageTextStrategy;

impl HashrateStrategy for PageTextStrategy {
    fn name(&self) -> &'static str {
        "page-text"
    }

    fn find(&self, document: &Html) -> Option<String> {
        let root = document.root_element();
        let body = root
            .children()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "body")
            .unwrap_or(root);

        find_hash_rate(&visible_text(body)).map(str::to_string)
    }
}

pub fn default_strategies() -> Vec<Box<dyn HashrateStrategy>> {
    let mut strategies: Vec<Box<dyn HashrateStrategy>> = HASHRATE_LABELS
        .iter()
        .map(|(name, label)| Box::new(LabelStrategy::new(*name, label.clone())) as Box<dyn HashrateStrategy>)
        .collect();
    strategies.push(Box::new(PageTextStrategy));
    strategies
}

pub struct Extractor {
    strategies: Vec<Box<dyn HashrateStrategy>>,
}

impl Extractor {
    pub fn new() -> Self {
        Self::with_strategies(default_strategies())
    }

    pub fn with_strategies(strategies: Vec<Box<dyn HashrateStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn extract(&self, html: &str) -> Reading {
        let document = Html::parse_document(html);

        let hashrate = self.strategies.iter().find_map(|strategy| {
            let value = strategy.find(&document)?;
            debug!("Hashrate matched by {} strategy: {}", strategy.name(), value);
            Some(value)
        });

        Reading {
            hashrate,
            workers: find_workers(&document),
        }
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

/// 使用默认策略提取算力与矿机数量
pub fn extract(html: &str) -> Reading {
    Extractor::new().extract(html)
}

// 矿机数量取 "Workers" 标签后第一个兄弟元素的文本
fn find_workers(document: &Html) -> Option<String> {
    let label = find_label(document, &WORKERS_LABEL)?;
    let sibling = label
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|el| !is_hidden_element(el.value()))?;

    let text = visible_text(sibling);
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

// 文档顺序中第一个文本匹配、且没有子元素同样匹配的可见元素
fn find_label<'a>(document: &'a Html, pattern: &Regex) -> Option<ElementRef<'a>> {
    document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| is_visible(*el))
        .find(|el| {
            pattern.is_match(&visible_text(*el))
                && !el
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|child| !is_hidden_element(child.value()))
                    .any(|child| pattern.is_match(&visible_text(child)))
        })
}

fn is_visible(el: ElementRef<'_>) -> bool {
    !std::iter::once(*el)
        .chain(el.ancestors())
        .filter_map(|node| node.value().as_element())
        .any(is_hidden_element)
}

fn is_hidden_element(el: &Element) -> bool {
    if HIDDEN_TAGS.contains(&el.name()) || el.attr("hidden").is_some() {
        return true;
    }
    if el
        .attr("aria-hidden")
        .is_some_and(|value| value.eq_ignore_ascii_case("true"))
    {
        return true;
    }
    el.attr("style").is_some_and(|style| {
        let style: String = style
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        style.contains("display:none") || style.contains("visibility:hidden")
    })
}

fn visible_text(el: ElementRef<'_>) -> String {
    let mut parts = Vec::new();
    collect_text(el, &mut parts);
    parts
        .iter()
        .flat_map(|part| part.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

fn collect_text<'a>(el: ElementRef<'a>, out: &mut Vec<&'a str>) {
    for child in el.children() {
        match child.value() {
            Node::Text(text) => out.push(&**text),
            Node::Element(inner) if !is_hidden_element(inner) => {
                if let Some(inner) = ElementRef::wrap(child) {
                    collect_text(inner, out);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(body: &str) -> String {
        format!("<!DOCTYPE html><html><head><title>24H Hashrate 1 H/s</title></head><body>{}</body></html>", body)
    }

    #[test]
    fn hash_rate_pattern() {
        assert_eq!(find_hash_rate("12.5 TH/s"), Some("12.5 TH/s"));
        assert_eq!(find_hash_rate("1,234 H/s"), Some("1,234 H/s"));
        assert_eq!(find_hash_rate("0.98GH/s"), Some("0.98GH/s"));
        assert_eq!(find_hash_rate("about 3 mh/s now"), Some("3 mh/s"));
        assert_eq!(find_hash_rate("24H Hashrate: .75 PH/s"), Some(".75 PH/s"));
        assert_eq!(find_hash_rate("1.234,5 TH/s"), Some("1.234,5 TH/s"));
        assert_eq!(find_hash_rate("1.234.567 H/s"), Some("1.234.567 H/s"));
        assert_eq!(find_hash_rate("TH/s"), None);
        assert_eq!(find_hash_rate("12.5 watts"), None);
    }

    #[test]
    fn value_in_label_sibling() {
        let html = page(r#"<div class="card"><span>24H Hashrate</span><span> 5.2 TH/s </span></div>"#);
        assert_eq!(extract(&html).hashrate.as_deref(), Some("5.2 TH/s"));
    }

    #[test]
    fn value_inline_with_label() {
        let html = page("<p>24H Hashrate: 5.2 TH/s</p>");
        assert_eq!(extract(&html).hashrate.as_deref(), Some("5.2 TH/s"));
    }

    #[test]
    fn value_split_across_nested_spans() {
        let html = page(
            r#"<div class="stat">
                 <div class="title">24 Hour Average Hashrate</div>
                 <div class="value"><span>3.14</span> <span>PH/s</span></div>
               </div>"#,
        );
        assert_eq!(extract(&html).hashrate.as_deref(), Some("3.14 PH/s"));
    }

    #[test]
    fn specific_label_wins_over_general() {
        let html = page(
            r#"<div><span>Average Hashrate</span><span>1 GH/s</span></div>
               <div><span>24H Hashrate</span><span>780.4 MH/s</span></div>"#,
        );
        assert_eq!(extract(&html).hashrate.as_deref(), Some("780.4 MH/s"));
    }

    #[test]
    fn hidden_elements_are_skipped() {
        let html = page(
            r#"<div style="display: none"><span>24H Hashrate</span><span>9 TH/s</span></div>
               <div hidden><span>24H Hashrate</span><span>8 TH/s</span></div>
               <div><span>24H Hashrate</span><span>1.5 TH/s</span></div>"#,
        );
        assert_eq!(extract(&html).hashrate.as_deref(), Some("1.5 TH/s"));
    }

    #[test]
    fn aria_hidden_and_invisible_labels_are_skipped() {
        let html = page(
            r#"<div aria-hidden="TRUE"><span>24H Hashrate</span><span>9 TH/s</span></div>
               <div style="visibility : hidden"><span>24H Hashrate</span><span>8 TH/s</span></div>
               <div><span>24H Hashrate</span><span>2.5 TH/s</span></div>"#,
        );
        assert_eq!(extract(&html).hashrate.as_deref(), Some("2.5 TH/s"));
    }

    #[test]
    fn hidden_sibling_values_are_skipped() {
        let html = page(
            r#"<div><span>24H Hashrate</span><span aria-hidden="true">9 TH/s</span><span>4 TH/s</span></div>"#,
        );
        assert_eq!(extract(&html).hashrate.as_deref(), Some("4 TH/s"));
    }

    #[test]
    fn workers_skip_hidden_first_sibling() {
        let html = page(
            r#"<div><span>Workers</span><span style="display:none">99</span><span>7</span></div>"#,
        );
        assert_eq!(extract(&html).workers.as_deref(), Some("7"));
    }

    #[test]
    fn falls_back_to_page_text() {
        let html = page(
            r#"<script>var cached = "99 TH/s";</script>
               <header>Pool overview</header>
               <p>Current speed 7.5 gh/s across all miners</p>"#,
        );
        let reading = extract(&html);
        assert_eq!(reading.hashrate.as_deref(), Some("7.5 gh/s"));
    }

    #[test]
    fn no_value_anywhere_is_none() {
        let html = page("<div><span>24H Hashrate</span><span>--</span></div>");
        let reading = extract(&html);
        assert_eq!(reading.hashrate, None);
        assert_eq!(reading.workers, None);
    }

    #[test]
    fn workers_from_next_sibling() {
        let html = page(
            r#"<ul>
                 <li><span>24H Hashrate</span><span>2 TH/s</span></li>
                 <li><span>Active Workers</span> <b> 12 </b></li>
               </ul>"#,
        );
        let reading = extract(&html);
        assert_eq!(reading.hashrate.as_deref(), Some("2 TH/s"));
        assert_eq!(reading.workers.as_deref(), Some("12"));
    }

    #[test]
    fn empty_workers_sibling_is_none() {
        let html = page("<div><span>Worker</span><span>   </span></div>");
        assert_eq!(extract(&html).workers, None);
    }

    #[test]
    fn custom_strategy_order() {
        let extractor = Extractor::with_strategies(vec![Box::new(PageTextStrategy)]);
        let html = page(
            r#"<p>Pool 10 PH/s</p><div><span>24H Hashrate</span><span>4 TH/s</span></div>"#,
        );
        assert_eq!(extractor.extract(&html).hashrate.as_deref(), Some("10 PH/s"));
    }
}
