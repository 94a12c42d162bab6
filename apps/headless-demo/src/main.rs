mod host;

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use waterfall_core::{Clock, ScrollToOptions, Size, SystemClock};
use waterfall_plugin::{Hook, WaterfallProps};
use waterfall_plugins::{
    Breakpoint, ClickAnalyticsPlugin, ClickCounts, InfiniteScrollPlugin, ResponsiveColumnsPlugin,
    SortPlugin,
};
use waterfall_ui::{Frame, Waterfall, LAYOUT_COMPLETE_EVENT};

use host::HeadlessHost;

#[derive(Clone, Debug)]
struct Card {
    id: u32,
    height: f32,
}

fn cards(from: u32, count: u32) -> Vec<Card> {
    (from..from + count)
        .map(|id| Card {
            id,
            // Deterministic spread between 80 and 320.
            height: 80.0 + ((id * 37) % 241) as f32,
        })
        .collect()
}

fn main() {
    #[cfg(feature = "logging")]
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    println!("=== Waterfall Headless Demo ===");
    println!("Lays out a masonry grid without a render tree:");
    println!("  - responsive columns switch on container resize");
    println!("  - only items near the viewport are rendered");
    println!("  - scrolling near the bottom asks for more items");
    println!();

    let clock = Rc::new(SystemClock::new());
    let host = HeadlessHost::new(Size::new(720.0, 600.0));
    let props = WaterfallProps::new(cards(0, 40))
        .columns(3)
        .gap(12.0)
        .padding(16.0)
        .debounce(Duration::from_millis(30));
    let mut waterfall = Waterfall::new(props, host.metrics()).with_clock(clock.clone());

    let wanted_more = Rc::new(Cell::new(false));
    let loads = Rc::clone(&wanted_more);
    waterfall.register_plugins([
        ResponsiveColumnsPlugin::new([
            Breakpoint::new(0.0, 2),
            Breakpoint::new(640.0, 3),
            Breakpoint::new(1024.0, 5),
        ])
        .into(),
        SortPlugin::by(|a: &Card, b: &Card| a.id.cmp(&b.id)).into(),
        InfiniteScrollPlugin::new()
            .threshold(200.0)
            .on_load_more(move |load| {
                log::info!(
                    "[demo] {} px from the bottom with {} items, loading more",
                    load.distance,
                    load.item_count
                );
                loads.set(true);
            })
            .into(),
        ClickAnalyticsPlugin::new().log(true).into(),
    ]);
    let _layouts = waterfall.bus().on(LAYOUT_COMPLETE_EVENT, |_| {
        log::debug!("[demo] layout complete");
        Ok(())
    });

    waterfall.mount();
    settle(&mut waterfall, &host, clock.as_ref());
    print_frame("mounted", &mut waterfall);
    println!("columns: {:?}", waterfall.column_heights());

    host.resize(Size::new(1100.0, 600.0));
    waterfall.notify_container_resize();
    settle(&mut waterfall, &host, clock.as_ref());
    print_frame("resized to 1100px", &mut waterfall);

    for step in 1..=4 {
        let total_height = waterfall.layout_info().total_height;
        let top = (total_height - 600.0) * step as f32 / 4.0;
        let metrics = host.scroll_to(top, total_height);
        waterfall.notify_scroll(metrics);
        settle(&mut waterfall, &host, clock.as_ref());
        print_frame(&format!("scrolled to {top:.0}"), &mut waterfall);

        if wanted_more.replace(false) {
            let count = waterfall.source_props().items.len() as u32;
            let mut items = waterfall.source_props().items.to_vec();
            items.extend(cards(count, 20));
            waterfall.set_items(items);
            settle(&mut waterfall, &host, clock.as_ref());
            println!("loaded: {} items", waterfall.items().len());
        }
    }

    for index in [3, 3, 7] {
        if let Err(err) = waterfall.item_click(index) {
            log::warn!("[demo] click failed: {err}");
        }
    }
    if let Some(counts) = waterfall
        .render_layer(Hook::RenderOverlay)
        .into_iter()
        .find_map(|layer| layer.downcast_ref::<ClickCounts>().cloned())
    {
        println!("clicks: {} total, item 3 clicked {} times", counts.total, counts.count(3));
    }

    match waterfall.scroll_to_item(10, ScrollToOptions::default()) {
        Ok(()) => {
            for request in waterfall.take_scroll_requests() {
                println!("host should scroll to {:.0}", request.top);
            }
        }
        Err(err) => log::warn!("[demo] {err}"),
    }

    waterfall.destroy();
    println!("destroyed; {} items still observed", host.observed_count());
}

/// Pumps until nothing is pending, sleeping until the next deadline and
/// answering measurement subscriptions with the real card heights.
fn settle(waterfall: &mut Waterfall<Card>, host: &HeadlessHost, clock: &dyn Clock) {
    for _ in 0..200 {
        while waterfall.pump() {}
        waterfall.frame();
        let reported = host.report_sizes(waterfall, |card| card.height);
        if reported {
            continue;
        }
        match waterfall.next_deadline() {
            Some(deadline) => {
                std::thread::sleep(deadline.saturating_sub(clock.now()));
            }
            None => return,
        }
    }
    log::warn!("[demo] composition did not settle");
}

fn print_frame(label: &str, waterfall: &mut Waterfall<Card>) {
    let frame: Frame<String> =
        waterfall.render_with(&mut |card: &Card, _index: usize| format!("card #{}", card.id));
    println!(
        "[{label}] {} rendered of {}, total height {:.0}",
        frame.len(),
        waterfall.items().len(),
        frame.total_height
    );
    for item in frame.items.iter().take(6) {
        println!(
            "    {:<10} x={:>6.1} y={:>7.1} {:>5.1}x{:<5.1}",
            item.content,
            item.position.x,
            item.position.y,
            item.position.width,
            item.position.height
        );
    }
    if frame.len() > 6 {
        println!("    ... {} more", frame.len() - 6);
    }
}
