//! lazyimg demo
//!
//! Places one lazy image below the fold, scrolls to it and reports what
//! happened.
//!
//! ```text
//! lazyimg-demo <base> <image-id> [alt] [--options options.json] [--dpr 2]
//! ```

use anyhow::{bail, Context};
use lazyimg::dom::DOMRect;
use lazyimg::net::HttpFetcher;
use lazyimg::{Page, WidgetOptions};
use tracing_subscriber::EnvFilter;

struct Args {
    base: String,
    image_id: String,
    alt: String,
    options: Option<String>,
    dpr: f64,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut positional = Vec::new();
    let mut options = None;
    let mut dpr = 1.0;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--options" => options = Some(args.next().context("--options needs a path")?),
            "--dpr" => {
                let value = args.next().context("--dpr needs a number")?;
                dpr = value.parse().with_context(|| format!("invalid --dpr {value}"))?;
            }
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let (Some(base), Some(image_id)) = (positional.next(), positional.next()) else {
        bail!("usage: lazyimg-demo <base> <image-id> [alt] [--options file.json] [--dpr N]");
    };
    Ok(Args {
        base,
        image_id,
        alt: positional.next().unwrap_or_default(),
        options,
        dpr,
    })
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = parse_args()?;
    let options = match &args.options {
        Some(path) => {
            let json = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
            WidgetOptions::from_json(&json).with_context(|| format!("parsing {path}"))?
        }
        None => WidgetOptions::default(),
    };
    let fade_ms = options.fade_duration_ms;

    tracing::info!("lazyimg v{}", lazyimg::VERSION);

    let fetcher = HttpFetcher::new()?;
    let mut page = Page::new(fetcher, options)?
        .with_viewport(1280.0, 800.0)
        .with_device_pixel_ratio(args.dpr);

    let img = page.create_lazy_image()?;
    page.set_base(img, &args.base)?;
    page.set_image_id(img, &args.image_id)?;
    page.set_alt(img, &args.alt)?;
    page.connect(img, DOMRect::new(0.0, 2000.0, 640.0, 360.0))?;

    smol::block_on(async {
        page.pump().await;
        tracing::info!(state = ?page.state(img), "before scrolling");

        page.scroll_to(1600.0);
        page.pump().await;
    });
    page.advance(fade_ms);

    let widget = page.widget(img).context("widget vanished")?;
    println!("aspect-ratio: {}", widget.aspect_ratio());
    println!("state:        {:?}", widget.state());
    println!("placeholder:  {}", if widget.placeholder().is_some() { "present" } else { "removed" });
    if let Some(src) = page.tree().get_attribute(widget.image(), "src") {
        println!("high-res:     {src}");
    }
    Ok(())
}
