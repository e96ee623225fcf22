use async_trait::async_trait;
use koushin_lib::prelude::*;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};

use crate::http::{ensure_markup, fetch_text};

pub const BASE_URL: &str = "https://www.mangaread.org";

/// Markup layouts seen on the home page, tried in order:
/// (item, title link, chapter link, update date)
const FEED_LAYOUTS: &[(&str, &str, &str, &str)] = &[
    (
        "div.lastest-update .update-item",
        ".manga-info h3 a",
        ".chapter a",
        ".time",
    ),
    (
        ".page-item-detail",
        ".post-title a",
        ".chapter-item .chapter a",
        ".chapter-item .post-on",
    ),
];

const CHAPTER_ITEMS: &[&str] = &["li.wp-manga-chapter", ".chapters-list ul li"];

/// Adapter for mangaread.org, a Madara themed WordPress site.
#[derive(Clone)]
pub struct MangaRead {
    base_url: String,
    client: Client,
}

impl MangaRead {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, BASE_URL)
    }

    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    fn manga_url(&self, slug: &str) -> String {
        format!("{}/manga/{}/", self.base_url, slug)
    }

    async fn fetch_chapters_ajax(&self, slug: &str) -> Result<String> {
        let url = format!("{}ajax/chapters/", self.manga_url(slug));
        debug!("POST {url}");

        let res = self
            .client
            .post(&url)
            .header("X-Requested-With", "XMLHttpRequest")
            .send()
            .await
            .map_err(|e| Error::fetch(&url, e))?;

        let status = res.status();
        if !status.is_success() {
            return Err(Error::Status {
                url,
                status: status.as_u16(),
            });
        }

        res.text().await.map_err(|e| Error::fetch(&url, e))
    }
}

#[async_trait]
impl Scraper for MangaRead {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_latest_updates(&self) -> Result<Vec<LatestUpdate>> {
        let url = format!("{}/", self.base_url);
        let body = fetch_text(&self.client, &url).await?;
        ensure_markup(&url, &body)?;

        parse_latest_updates(&body)
    }

    async fn get_manga_detail(&self, slug: &str) -> Result<MangaDetail> {
        let url = self.manga_url(slug);
        let body = fetch_text(&self.client, &url).await?;
        ensure_markup(&url, &body)?;

        parse_manga_detail(&body)
    }

    async fn get_chapter_list(&self, slug: &str) -> Result<Vec<ChapterListing>> {
        let url = self.manga_url(slug);
        let body = fetch_text(&self.client, &url).await?;
        ensure_markup(&url, &body)?;

        let chapters = parse_chapter_list(&body)?;
        if !chapters.is_empty() {
            return Ok(chapters);
        }

        // newer builds of the theme only render the list through ajax
        let body = self.fetch_chapters_ajax(slug).await?;
        parse_chapter_list(&body)
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::parse(css, format!("{e:?}")))
}

fn collapse_text(el: ElementRef) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}

/// Text of the first match, or the `title` attribute of a link inside it
/// when the text is empty (used for "2 hours ago" badges).
fn first_text(scope: ElementRef, sel: &Selector) -> Option<String> {
    let el = scope.select(sel).next()?;
    non_empty(collapse_text(el)).or_else(|| {
        el.value()
            .attr("title")
            .or_else(|| {
                el.descendants()
                    .filter_map(ElementRef::wrap)
                    .find_map(|child| child.value().attr("title"))
            })
            .map(|t| t.trim().to_string())
            .and_then(non_empty)
    })
}

/// `https://www.mangaread.org/manga/solo-leveling/chapter-2/` => `solo-leveling`
pub fn slug_from_href(href: &str) -> Option<String> {
    let (_, rest) = href.split_once("/manga/")?;
    rest.split(['/', '?', '#'])
        .next()
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
}

pub fn parse_latest_updates(body: &str) -> Result<Vec<LatestUpdate>> {
    let document = Html::parse_document(body);

    for (item_css, title_css, chapter_css, date_css) in FEED_LAYOUTS {
        let item_sel = selector(item_css)?;
        let title_sel = selector(title_css)?;
        let chapter_sel = selector(chapter_css)?;
        let date_sel = selector(date_css)?;

        let mut items = document.select(&item_sel).peekable();
        if items.peek().is_none() {
            continue;
        }

        let mut updates = vec![];
        for item in items {
            let Some(link) = item.select(&title_sel).next() else {
                continue;
            };
            let title = collapse_text(link);
            let slug = link.value().attr("href").and_then(slug_from_href);
            let chapter = first_text(item, &chapter_sel);

            match (non_empty(title), slug, chapter) {
                (Some(title), Some(slug), Some(chapter)) => updates.push(LatestUpdate {
                    title,
                    slug,
                    chapter,
                    updated: first_text(item, &date_sel).unwrap_or_default(),
                }),
                _ => {
                    trace!("skip incomplete feed item");
                }
            }
        }

        return Ok(updates);
    }

    debug!("no known feed layout matched");
    Ok(vec![])
}

pub fn parse_manga_detail(body: &str) -> Result<MangaDetail> {
    let document = Html::parse_document(body);
    let root = document.root_element();

    let title = first_text(root, &selector(".post-title h1")?)
        .or(first_text(root, &selector(".manga-info h1")?))
        .ok_or_else(|| Error::parse("manga detail", "missing title"))?;

    let description_sel = selector(".summary__content p")?;
    let description = non_empty(
        document
            .select(&description_sel)
            .map(collapse_text)
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
    )
    .or(first_text(root, &selector(".summary__content")?));

    let author_sel = selector(".author-content a")?;
    let author = non_empty(
        document
            .select(&author_sel)
            .map(collapse_text)
            .filter(|a| !a.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
    );

    let status_sel = selector(".post-status .summary-content")?;
    let status = document
        .select(&status_sel)
        .last()
        .map(collapse_text)
        .and_then(non_empty);

    let cover_sel = selector(".summary_image img")?;
    let cover_url = document.select(&cover_sel).next().and_then(|img| {
        let value = img.value();
        value
            .attr("data-src")
            .or(value.attr("src"))
            .map(|src| src.trim().to_string())
    });

    let tag_sel = selector(".genres-content a")?;
    let tags = document
        .select(&tag_sel)
        .map(collapse_text)
        .filter(|tag| !tag.is_empty())
        .collect();

    Ok(MangaDetail {
        title,
        description,
        author,
        status,
        cover_url,
        tags,
    })
}

pub fn parse_chapter_list(body: &str) -> Result<Vec<ChapterListing>> {
    let document = Html::parse_document(body);
    let link_sel = selector("a")?;
    let date_sel = selector(".chapter-release-date")?;

    let mut chapters = vec![];
    for item_css in CHAPTER_ITEMS {
        let item_sel = selector(item_css)?;
        for item in document.select(&item_sel) {
            let Some(link) = item.select(&link_sel).next() else {
                continue;
            };
            let Some(label) = non_empty(collapse_text(link)) else {
                continue;
            };

            chapters.push(ChapterListing {
                label,
                title: None,
                date: first_text(item, &date_sel).unwrap_or_default(),
                url: link.value().attr("href").unwrap_or_default().to_string(),
            });
        }

        if !chapters.is_empty() {
            break;
        }
    }

    let numbers: Option<Vec<ChapterNumber>> = chapters
        .iter()
        .map(|c| ChapterNumber::parse(&c.label))
        .collect();
    if let Some(numbers) = numbers {
        let mut paired: Vec<_> = numbers.into_iter().zip(chapters).collect();
        paired.sort_by(|(a, _), (b, _)| b.cmp(a));
        chapters = paired.into_iter().map(|(_, chapter)| chapter).collect();
    }

    Ok(chapters)
}
