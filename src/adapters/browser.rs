//! `CardSource` backed by a real Chromium over the DevTools protocol.

use crate::adapters::page::PageSnapshot;
use crate::config::ScraperConfig;
use crate::domain::model::CardToken;
use crate::domain::ports::CardSource;
use crate::utils::error::{Result, ScrapeError};
use crate::utils::validation::validate_required_field;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::sleep;

const CLICK_LOGIN_LINK_JS: &str = r#"
(() => {
    const link = [...document.querySelectorAll('a.auth-link')]
        .find(a => (a.innerText || a.textContent || '').trim().toLowerCase() === 'login');
    if (link) { link.click(); return true; }
    return false;
})()
"#;

const CLICK_CASINO_JS: &str = r#"
(() => {
    const U = s => (s || '').toUpperCase();
    const visible = el => !!(el && (el.offsetWidth || el.offsetHeight || el.getClientRects().length));
    const click = el => { el.scrollIntoView({block: 'center'}); el.click(); return true; };

    const labelled = [...document.querySelectorAll('a,button')]
        .find(e => visible(e) && U(e.innerText || e.textContent).includes('CASINO'));
    if (labelled) return click(labelled);

    const linked = [...document.querySelectorAll("a[href*='casino']")].find(visible);
    if (linked) return click(linked);

    const leaf = [...document.querySelectorAll('div,span,li')]
        .find(e => visible(e) && e.children.length === 0 && U(e.innerText || e.textContent).includes('CASINO'));
    if (leaf) return click(leaf);

    // 收合的選單：先展開，下一輪再找
    const togglers = [...document.querySelectorAll(
        "button.navbar-toggler, button[class*='hamburger'], button[class*='menu'], button[aria-label='Toggle navigation']"
    )].filter(visible).slice(0, 2);
    togglers.forEach(t => { try { t.click(); } catch (e) {} });
    return false;
})()
"#;

const CLICK_LUCKY7_JS: &str = r#"
(() => {
    const U = s => (s || '').toUpperCase().replace(/\s+/g, ' ');
    const visible = el => !!(el && (el.offsetWidth || el.offsetHeight || el.getClientRects().length));
    const matches = e => { const t = U(e.innerText || e.textContent); return t.includes('LUCKY 7') || t.includes('LUCKY7'); };

    const tab = [...document.querySelectorAll('a,button,li,span,div')]
        .filter(e => visible(e) && matches(e))
        .find(e => ![...e.children].some(matches));
    if (tab) {
        tab.scrollIntoView({block: 'center', inline: 'center'});
        tab.click();
        return true;
    }

    [...document.querySelectorAll("[class*='tabs'], [class*='nav'], [class*='tab']")].slice(0, 3).forEach(c => {
        if (c.scrollWidth > c.clientWidth) { c.scrollLeft += 200; }
    });
    return false;
})()
"#;

const CLICK_FIRST_TILE_JS: &str = r#"
(() => {
    const pane = document.querySelector('.tab-pane.active') || document;
    const name = pane.querySelector('.casino-name');
    const target = (name && name.parentElement)
        || pane.querySelector("[class*='casinoicon'], [class*='casino-'], a");
    if (!target) return false;
    target.scrollIntoView({block: 'center'});
    target.click();
    return true;
})()
"#;

const FIRST_IFRAME_SRC_JS: &str = r#"
(() => {
    const frame = document.querySelector('iframe');
    return frame && frame.src ? frame.src : '';
})()
"#;

// 跨網域的 frame 讀不到 contentDocument，回傳空字串
const FRAME_DOCUMENTS_JS: &str = r#"
(() => [...document.querySelectorAll('iframe')].map(frame => {
    try {
        const doc = frame.contentDocument;
        return doc && doc.documentElement ? doc.documentElement.outerHTML : '';
    } catch (e) {
        return '';
    }
}))()
"#;

pub struct ChromeSession {
    browser: Browser,
    handler: JoinHandle<()>,
    page: Page,
    url: String,
    username: String,
    password: String,
    debug_dir: PathBuf,
    round_timeout: Duration,
    last_card_at: Instant,
    snapshot: PageSnapshot,
}

impl ChromeSession {
    pub async fn launch(config: &ScraperConfig) -> Result<Self> {
        let username = validate_required_field("site.username", &config.site.username)?.clone();
        let password = validate_required_field("site.password", &config.site.password)?.clone();
        let options = &config.browser;

        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(options.window_width, options.window_height)
            .viewport(Viewport {
                width: options.window_width,
                height: options.window_height,
                device_scale_factor: Some(1.0),
                ..Default::default()
            })
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--log-level=3")
            // with_head() 避免 chromiumoxide 加上舊版 --headless
            .with_head();

        if options.headless {
            builder = builder.arg("--headless=new");
        }

        if let Some(path) = &options.chrome_executable {
            builder = builder.chrome_executable(path);
        }

        let browser_config = builder
            .build()
            .map_err(|message| ScrapeError::BrowserError { message })?;

        let (browser, mut handler) = Browser::launch(browser_config).await?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("DevTools handler event error: {}", e);
                }
            }
        });

        let page = browser.new_page("about:blank").await?;
        tracing::info!("🌐 Browser launched (headless: {})", options.headless);

        Ok(Self {
            browser,
            handler,
            page,
            url: config.site.url.clone(),
            username,
            password,
            debug_dir: PathBuf::from(&config.output.debug_dir),
            round_timeout: Duration::from_secs(config.polling.round_timeout_secs),
            last_card_at: Instant::now(),
            snapshot: PageSnapshot::default(),
        })
    }

    async fn eval<T: DeserializeOwned>(&self, js: &str) -> Result<T> {
        Ok(self.page.evaluate(js).await?.into_value::<T>()?)
    }

    /// Runs a click script until it reports success or `timeout` passes.
    async fn click_until(&self, js: &str, timeout: Duration, settle: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            match self.eval::<bool>(js).await {
                Ok(true) => {
                    sleep(settle).await;
                    return true;
                }
                Ok(false) => {}
                Err(e) => tracing::debug!("Click script failed (page may be loading): {}", e),
            }
            if Instant::now() >= deadline {
                return false;
            }
            sleep(Duration::from_millis(500)).await;
        }
    }

    async fn fill_credentials(&self) -> Result<()> {
        let user_input = self.page.find_element("input[name='User Name']").await?;
        let pass_input = self.page.find_element("input[name='Password']").await?;

        user_input
            .call_js_fn("function() { this.value = ''; }", false)
            .await?;
        user_input.click().await?.type_str(&self.username).await?;

        pass_input
            .call_js_fn("function() { this.value = ''; }", false)
            .await?;
        pass_input
            .click()
            .await?
            .type_str(&self.password)
            .await?
            .press_key("Enter")
            .await?;
        Ok(())
    }

    /// Switches to the newest tab when the game tile opened one.
    async fn follow_new_window(&mut self) -> Result<()> {
        let current = self.page.target_id().clone();
        let newest = self
            .browser
            .pages()
            .await?
            .into_iter()
            .filter(|page| *page.target_id() != current)
            .last();
        if let Some(page) = newest {
            tracing::info!("🪟 Game opened in a new window, switching to it");
            self.page = page;
        }
        Ok(())
    }

    /// Loads the game iframe as the top document so its DOM can be read directly.
    async fn enter_game_frame(&mut self) -> Result<()> {
        let src: String = self.eval(FIRST_IFRAME_SRC_JS).await?;
        if src.is_empty() {
            tracing::info!("No game iframe found, reading the current document");
            return Ok(());
        }
        tracing::debug!("Entering game iframe: {}", src);
        self.page.goto(src.as_str()).await?;
        Ok(())
    }

    async fn write_debug_file(&self, name: String, data: &[u8]) {
        let path = self.debug_dir.join(name);
        if let Err(e) = tokio::fs::write(&path, data).await {
            tracing::warn!("⚠️ Failed to save debug file {}: {}", path.display(), e);
        }
    }
}

#[async_trait]
impl CardSource for ChromeSession {
    async fn login(&mut self) -> Result<()> {
        tracing::info!("🔐 Logging in at {}", self.url);
        self.page
            .goto(self.url.as_str())
            .await
            .map_err(|e| ScrapeError::LoginError {
                message: format!("could not open {}: {}", self.url, e),
            })?;
        sleep(Duration::from_millis(2500)).await;

        if self.eval::<bool>(CLICK_LOGIN_LINK_JS).await.unwrap_or(false) {
            tracing::debug!("Opened the login form");
        }
        sleep(Duration::from_secs(1)).await;

        match self.fill_credentials().await {
            Ok(()) => tracing::info!("✅ Logged in"),
            Err(e) => tracing::warn!("⚠️ Login inputs not found; maybe already logged in ({})", e),
        }
        sleep(Duration::from_secs(2)).await;
        self.dump_debug("after_login").await;
        Ok(())
    }

    async fn navigate_to_game(&mut self) -> Result<()> {
        if !self
            .click_until(CLICK_CASINO_JS, Duration::from_secs(45), Duration::from_millis(1500))
            .await
        {
            return Err(ScrapeError::NavigationError {
                message: "Casino link not found".to_string(),
            });
        }

        // 有些頁面已經停在 Lucky 7 分頁
        if !self
            .click_until(CLICK_LUCKY7_JS, Duration::from_secs(40), Duration::from_millis(1200))
            .await
        {
            tracing::info!("Lucky 7 tab not found, assuming it is already active");
        }

        if !self.eval::<bool>(CLICK_FIRST_TILE_JS).await? {
            return Err(ScrapeError::NavigationError {
                message: "No game tiles found in Lucky 7 pane".to_string(),
            });
        }
        sleep(Duration::from_millis(800)).await;

        self.follow_new_window().await?;
        sleep(Duration::from_secs(2)).await;
        self.enter_game_frame().await?;

        self.last_card_at = Instant::now();
        self.dump_debug("after_enter_game").await;
        Ok(())
    }

    async fn read_current_card_token(&mut self) -> Result<Option<CardToken>> {
        let html = self.page.content().await?;
        let mut snapshot = PageSnapshot::parse(&html);

        if snapshot.card_token().is_none() {
            match self.eval::<Vec<String>>(FRAME_DOCUMENTS_JS).await {
                Ok(frames) if !frames.is_empty() => snapshot = snapshot.or_frames(&frames),
                Ok(_) => {}
                Err(e) => tracing::debug!("Could not read frame documents: {}", e),
            }
        }
        self.snapshot = snapshot;

        let token = self.snapshot.card_token();
        if token.is_some() {
            self.last_card_at = Instant::now();
        }
        Ok(token)
    }

    async fn read_round_id(&mut self) -> Result<Option<String>> {
        Ok(self.snapshot.round_id.clone())
    }

    fn is_stale(&self) -> bool {
        self.last_card_at.elapsed() >= self.round_timeout
    }

    async fn refresh(&mut self) -> Result<()> {
        self.page.reload().await?;
        sleep(Duration::from_secs(5)).await;
        self.snapshot = PageSnapshot::default();
        self.last_card_at = Instant::now();
        Ok(())
    }

    async fn dump_debug(&mut self, tag: &str) {
        if let Err(e) = tokio::fs::create_dir_all(&self.debug_dir).await {
            tracing::warn!("⚠️ Failed to create {}: {}", self.debug_dir.display(), e);
            return;
        }

        match self.page.content().await {
            Ok(html) => self.write_debug_file(format!("{}.html", tag), html.as_bytes()).await,
            Err(e) => tracing::warn!("⚠️ Failed to read page source for {}: {}", tag, e),
        }

        let params = ScreenshotParams::builder().full_page(true).build();
        match self.page.screenshot(params).await {
            Ok(png) => self.write_debug_file(format!("{}.png", tag), &png).await,
            Err(e) => tracing::warn!("⚠️ Failed to take screenshot for {}: {}", tag, e),
        }
        tracing::debug!("Saved debug snapshot '{}'", tag);
    }

    async fn close(&mut self) -> Result<()> {
        self.browser.close().await?;
        self.browser.wait().await?;
        self.handler.abort();
        Ok(())
    }
}
