use std::{borrow::Cow, ffi::OsStr, sync::Arc, time::Duration};

use anyhow::Context as _;
use headless_chrome::{Browser, LaunchOptions, Tab, browser::tab::NoElementFound};
use tokio::{
    task::spawn_blocking,
    time::{Instant, sleep},
};

const POLL: Duration = Duration::from_millis(400);

/// Disclosure widgets the portal uses to truncate long value lists.
const DISCLOSURES: [&str; 3] = [
    "//a[translate(normalize-space(.), 'MORE', 'more') = 'more']",
    "//button[translate(normalize-space(.), 'MORE', 'more') = 'more']",
    "//input[contains(translate(@value, 'MORE', 'more'), 'more')]",
];

pub fn launch(headed: bool) -> anyhow::Result<Browser> {
    Browser::new(LaunchOptions {
        args: vec![OsStr::new("--disable-blink-features=AutomationControlled")],
        headless: !headed,
        window_size: Some((1280, 720)),
        ..LaunchOptions::default()
    })
    .context("failed to launch Chromium")
}

/// One working tab. Anything else (restored sessions, target="_blank" leaks)
/// is closed so the portal cannot move focus away from the scrape.
pub fn single_tab(browser: &Browser) -> anyhow::Result<Arc<Tab>> {
    let tab = browser.new_tab()?;

    let tabs_guard = browser
        .get_tabs()
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    for other in &*tabs_guard {
        if !Arc::ptr_eq(&tab, other) {
            other.close(true)?;
        }
    }
    drop(tabs_guard);

    Ok(tab)
}

pub async fn goto(tab: &Arc<Tab>, url: Cow<'static, str>) -> anyhow::Result<()> {
    let tab = Arc::clone(tab);

    spawn_blocking(move || {
        tab.navigate_to(&url)?;
        tab.wait_until_navigated().map(|_| ())
    })
    .await?
}

async fn find(tab: &Arc<Tab>, xpath: Cow<'static, str>) -> anyhow::Result<()> {
    let tab = Arc::clone(tab);

    spawn_blocking(move || tab.find_element_by_xpath(&xpath).map(|_| ())).await?
}

/// Poll until `xpath` resolves or `timeout` elapses. Errors other than
/// `NoElementFound` abort the wait immediately.
pub async fn wait_for(
    tab: &Arc<Tab>,
    xpath: Cow<'static, str>,
    timeout: Duration,
) -> anyhow::Result<()> {
    let deadline = Instant::now() + timeout;

    loop {
        match find(tab, xpath.clone()).await {
            Ok(()) => break Ok(()),
            Err(err) if !err.is::<NoElementFound>() => break Err(err),
            Err(err) => {
                if Instant::now() >= deadline {
                    break Err(err)
                        .with_context(|| format!("no element {xpath} after {}s", timeout.as_secs()));
                }
            }
        }

        sleep(POLL).await;
    }
}

pub async fn click(tab: &Arc<Tab>, xpath: Cow<'static, str>) -> anyhow::Result<()> {
    let tab = Arc::clone(tab);

    spawn_blocking(move || tab.find_element_by_xpath(&xpath)?.click().map(|_| ())).await?
}

/// Click every "more" expander on the current page; returns how many took.
pub async fn expand_disclosures(tab: &Arc<Tab>) -> anyhow::Result<usize> {
    let tab = Arc::clone(tab);

    spawn_blocking(move || {
        let mut clicked = 0;
        for xpath in DISCLOSURES {
            let Ok(widgets) = tab.find_elements_by_xpath(xpath) else {
                continue;
            };
            for widget in widgets {
                match widget.click() {
                    Ok(_) => clicked += 1,
                    Err(e) => tracing::warn!(target: "browser", "disclosure unclickable: {e:?}"),
                }
            }
        }
        clicked
    })
    .await
    .map_err(Into::into)
}

pub async fn content(tab: &Arc<Tab>) -> anyhow::Result<String> {
    let tab = Arc::clone(tab);

    spawn_blocking(move || tab.get_content()).await?
}

/// Portal links are located by their exact rendered text.
pub fn link_by_text(text: &str) -> Cow<'static, str> {
    format!("//a[normalize-space(.) = {}]", xpath_literal(text)).into()
}

/// XPath has no string escaping; quote-free text gets plain quoting and the
/// rest goes through concat().
fn xpath_literal(text: &str) -> String {
    if !text.contains('\'') {
        format!("'{text}'")
    } else if !text.contains('"') {
        format!("\"{text}\"")
    } else {
        let parts: Vec<String> = text.split('\'').map(|part| format!("'{part}'")).collect();
        format!("concat({})", parts.join(r#", "'", "#))
    }
}

#[cfg(test)]
mod tests {
    use super::{link_by_text, xpath_literal};

    #[test]
    fn plain_text_is_single_quoted() {
        assert_eq!(xpath_literal("DAD"), "'DAD'");
    }

    #[test]
    fn apostrophes_switch_to_double_quotes() {
        assert_eq!(xpath_literal("a'b"), "\"a'b\"");
    }

    #[test]
    fn mixed_quotes_use_concat() {
        assert_eq!(xpath_literal(r#"a'b"c"#), r#"concat('a', "'", 'b"c')"#);
    }

    #[test]
    fn link_selector_matches_normalized_text() {
        assert_eq!(
            link_by_text("a. DADyyyy: Discharge Abstract Database -DAD"),
            "//a[normalize-space(.) = 'a. DADyyyy: Discharge Abstract Database -DAD']"
        );
    }
}
