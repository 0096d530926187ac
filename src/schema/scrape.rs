use std::{sync::Arc, time::Duration};

use anyhow::Context as _;
use headless_chrome::Tab;
use idds::{
    browser::{self, link_by_text},
    extract::{self, DetailFields, Selectors},
    output::VariableRecord,
};
use tokio::time::sleep;

const PORTAL_URL: &str =
    "https://datadictionary.ices.on.ca/Applications/DataDictionary/Default.aspx";

/// The dataset page is the only portal page whose table mentions
/// "Variable Name".
const VARIABLES_TABLE: &str = "//table[contains(., 'Variable Name')]";

const LINK_WAIT: Duration = Duration::from_secs(30);
const LISTING_WAIT: Duration = Duration::from_secs(10);
const PAGE_SETTLE: Duration = Duration::from_secs(1);
const DETAIL_SETTLE: Duration = Duration::from_secs(5);
const EXPAND_SETTLE: Duration = Duration::from_secs(2);

pub struct Context {
    pub tab: Arc<Tab>,
    pub library: String,
    pub dataset: String,
    pub sel: Selectors,
}

pub async fn run(ctx: &Context) -> anyhow::Result<Vec<VariableRecord>> {
    tracing::info!(target: "schema", "navigating to the portal");
    browser::goto(&ctx.tab, PORTAL_URL.into())
        .await
        .context("portal unreachable")?;

    tracing::info!(target: "schema", "opening library {}", ctx.library);
    browser::wait_for(&ctx.tab, link_by_text(&ctx.library), LISTING_WAIT)
        .await
        .with_context(|| format!("library {:?} not on the portal landing page", ctx.library))?;
    browser::click(&ctx.tab, link_by_text(&ctx.library)).await?;

    // Only once the dataset link shows up are we really on the library page;
    // its URL is the way back for every per-variable round trip.
    browser::wait_for(&ctx.tab, link_by_text(&ctx.dataset), LINK_WAIT)
        .await
        .with_context(|| {
            format!(
                "dataset {:?} not listed under library {:?}",
                ctx.dataset, ctx.library
            )
        })?;
    let library_url = ctx.tab.get_url();
    tracing::debug!(target: "schema", "library page = {library_url}");

    tracing::info!(target: "schema", "opening dataset {:?}", ctx.dataset);
    open_dataset(ctx).await?;

    browser::wait_for(&ctx.tab, VARIABLES_TABLE.into(), LISTING_WAIT)
        .await
        .context("variables listing did not appear on the dataset page")?;
    let listing = browser::content(&ctx.tab).await?;
    let variables = extract::collect_variables(&listing, &ctx.sel);
    anyhow::ensure!(
        !variables.is_empty(),
        "dataset {:?} lists no variables",
        ctx.dataset
    );

    let total = variables.len();
    tracing::info!(
        target: "schema",
        "{total} variables listed ({} .. {})",
        variables[0].name,
        variables[total - 1].name,
    );

    let mut records = Vec::with_capacity(total);
    for (idx, variable) in variables.into_iter().enumerate() {
        tracing::info!(target: "schema", "[{}/{total}] {}", idx + 1, variable.name);

        let detail = variable_detail(ctx, &library_url, &variable.name)
            .await
            .with_context(|| format!("detail view of variable {:?} failed", variable.name))?;

        records.push(VariableRecord {
            variable_name: variable.name,
            main_description: variable.description,
            main_type: variable.data_type,
            label: detail.label,
            type_length: detail.type_length,
            available_in: detail.available_in,
            format: detail.format,
            value: detail.value,
            links: detail.links,
        });
    }

    Ok(records)
}

/// Click through to the dataset from the already-loaded library page.
async fn open_dataset(ctx: &Context) -> anyhow::Result<()> {
    browser::wait_for(&ctx.tab, link_by_text(&ctx.dataset), LINK_WAIT).await?;
    browser::click(&ctx.tab, link_by_text(&ctx.dataset))
        .await
        .with_context(|| format!("dataset link {:?} not clickable", ctx.dataset))?;
    sleep(PAGE_SETTLE).await;
    Ok(())
}

/// The portal has no per-variable URLs; every detail view is reached by
/// replaying library page -> dataset -> variable link.
async fn variable_detail(
    ctx: &Context,
    library_url: &str,
    variable: &str,
) -> anyhow::Result<DetailFields> {
    browser::goto(&ctx.tab, library_url.to_owned().into()).await?;
    sleep(PAGE_SETTLE).await;
    open_dataset(ctx).await?;

    browser::wait_for(&ctx.tab, link_by_text(variable), LINK_WAIT).await?;
    browser::click(&ctx.tab, link_by_text(variable)).await?;
    sleep(DETAIL_SETTLE).await;

    let page = browser::content(&ctx.tab).await?;
    let mut fields = extract::detail_fields(&page, &ctx.sel);

    let expanded = browser::expand_disclosures(&ctx.tab).await?;
    if expanded > 0 {
        tracing::debug!(target: "schema", "{variable}: expanded {expanded} disclosure(s)");
        sleep(EXPAND_SETTLE).await;
        let page = browser::content(&ctx.tab).await?;
        fields = extract::detail_fields(&page, &ctx.sel);
    }

    Ok(fields)
}
