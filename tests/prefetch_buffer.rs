use std::{
    io::Cursor,
    sync::{Arc, Mutex, mpsc},
    time::Duration,
};

use minute_sort::{
    Decode, DecodeError, FsDecoder, Game, GameOpts, Label, LabeledItem, Location, Point,
    PrefetchBuffer, Raster, SequenceList, Size, SortError,
};
use rand::{SeedableRng, rngs::StdRng};

const WAIT: Duration = Duration::from_secs(10);

fn png_bytes(w: u32, h: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba([200, 100, 50, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn shared_game(good: usize, bad: usize) -> Arc<Mutex<Game>> {
    Arc::new(Mutex::new(game(good, bad)))
}

/// `good` decodable items and `bad` undecodable ones, split over two labels.
fn game(good: usize, bad: usize) -> Game {
    let png = png_bytes(40, 20);
    let labels = [Label::new("left").unwrap(), Label::new("right").unwrap()];
    let mut items = Vec::new();
    for i in 0..good {
        let name = format!("good-{i}.png");
        items.push(Arc::new(
            LabeledItem::new(
                Location::memory(&name, png.clone()),
                labels[i % 2].clone(),
                name,
            )
            .unwrap(),
        ));
    }
    for i in 0..bad {
        let name = format!("bad-{i}.png");
        items.push(Arc::new(
            LabeledItem::new(
                Location::memory(&name, b"not a png".to_vec()),
                labels[(i + 1) % 2].clone(),
                name,
            )
            .unwrap(),
        ));
    }
    let list = SequenceList::with_rng(&items, StdRng::seed_from_u64(5)).unwrap();
    let opts = GameOpts {
        require_minimum_size: false,
        ..GameOpts::default()
    };
    Game::new("sort left from right", list, opts).unwrap()
}

fn bounds() -> Size {
    Size::new(200.0, 100.0)
}

fn center() -> Point {
    Point::new(100.0, 50.0)
}

#[test]
fn fills_to_target_without_consumer_calls() {
    let buffer = PrefetchBuffer::new(2, shared_game(6, 0), bounds(), center()).unwrap();
    assert!(buffer.wait_for_size(2, WAIT));
    assert!(buffer.wait_idle(WAIT));
    assert_eq!(buffer.size(), 2);
    assert_eq!(buffer.outstanding(), 0);
    assert_eq!(buffer.target(), 2);
}

#[test]
fn take_and_request_keeps_size_within_target() {
    let game = shared_game(6, 0);
    let buffer = PrefetchBuffer::new(2, Arc::clone(&game), bounds(), center()).unwrap();
    assert!(buffer.wait_for_size(2, WAIT));

    for _ in 0..4 {
        let ready = buffer.next_image().unwrap();
        assert!(ready.item.is_loaded());
        assert!(buffer.size() <= 2);
        buffer.request_more();
        assert!(buffer.wait_idle(WAIT));
        assert!(buffer.size() <= 2);
    }
    assert_eq!(buffer.size(), 2);
    assert_eq!(game.lock().unwrap().remaining(), 0);
}

#[test]
fn ready_items_are_fitted_and_centred() {
    let buffer = PrefetchBuffer::new(1, shared_game(2, 0), bounds(), center()).unwrap();
    assert!(buffer.wait_for_size(1, WAIT));
    let ready = buffer.next_image().unwrap();

    // 40x20 into 200x100 at 0.75 fill.
    assert_eq!(ready.raster.width(), 150);
    assert_eq!(ready.raster.height(), 75);
    assert_eq!(ready.placement.center(), center());
    assert_eq!(ready.placement.width(), 150.0);
}

#[test]
fn zero_target_starts_idle() {
    let buffer = PrefetchBuffer::new(0, shared_game(3, 0), bounds(), center()).unwrap();
    assert!(buffer.wait_idle(WAIT));
    assert_eq!(buffer.size(), 0);
    assert!(matches!(buffer.next_image(), Err(SortError::BufferEmpty)));

    buffer.request_more();
    assert!(buffer.wait_for_size(1, WAIT));
    assert_eq!(buffer.size(), 1);
}

#[test]
fn undecodable_items_are_skipped() {
    let buffer = PrefetchBuffer::new(7, shared_game(4, 3), bounds(), center()).unwrap();
    assert!(buffer.wait_idle(WAIT));

    let stats = buffer.stats();
    assert_eq!(stats.produced, 4);
    assert_eq!(stats.failed, 3);
    assert_eq!(buffer.outstanding(), 0);
    assert_eq!(buffer.size(), 4);
    while let Ok(ready) = buffer.next_image() {
        assert!(ready.item.display_name().starts_with("good-"));
    }
}

#[test]
fn exhaustion_lets_the_buffer_run_dry() {
    let game = shared_game(3, 0);
    let buffer = PrefetchBuffer::new(5, Arc::clone(&game), bounds(), center()).unwrap();
    assert!(buffer.wait_idle(WAIT));
    assert_eq!(buffer.size(), 3);
    assert_eq!(buffer.outstanding(), 0);
    assert_eq!(buffer.stats().exhausted, 1);

    for _ in 0..3 {
        buffer.next_image().unwrap();
    }
    assert!(matches!(buffer.next_image(), Err(SortError::BufferEmpty)));

    buffer.request_more();
    assert!(buffer.wait_idle(WAIT));
    assert_eq!(buffer.size(), 0);
    assert_eq!(buffer.stats().exhausted, 2);

    game.lock().unwrap().set_cycle(true);
    buffer.request_more();
    assert!(buffer.wait_for_size(1, WAIT));
}

#[test]
fn concurrent_requests_are_not_lost() {
    let game = shared_game(5, 0);
    game.lock().unwrap().set_cycle(true);
    let buffer = PrefetchBuffer::new(0, game, bounds(), center()).unwrap();

    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                for _ in 0..5 {
                    buffer.request_more();
                }
            });
        }
    });

    assert!(buffer.wait_for_size(20, WAIT));
    assert!(buffer.wait_idle(WAIT));
    assert_eq!(buffer.size(), 20);
    assert_eq!(buffer.stats().produced, 20);
}

#[test]
fn consumer_can_score_while_worker_runs() {
    let game = shared_game(6, 0);
    let buffer = PrefetchBuffer::new(3, Arc::clone(&game), bounds(), center()).unwrap();
    assert!(buffer.wait_for_size(1, WAIT));

    let ready = buffer.next_image().unwrap();
    let label = ready.item.label().clone();
    let score = game.lock().unwrap().score_image(&ready.item, &label);
    assert_eq!(score, 1);
}

#[test]
fn invalid_render_targets_are_rejected() {
    let game = shared_game(2, 0);
    for (b, c) in [
        (Size::new(0.0, 10.0), center()),
        (Size::new(10.0, -1.0), center()),
        (Size::new(f64::NAN, 10.0), center()),
        (bounds(), Point::new(f64::INFINITY, 0.0)),
    ] {
        assert!(matches!(
            PrefetchBuffer::new(1, Arc::clone(&game), b, c),
            Err(SortError::Validation(_))
        ));
    }
}

#[test]
fn shutdown_is_idempotent_and_drop_joins() {
    let mut buffer = PrefetchBuffer::new(2, shared_game(4, 0), bounds(), center()).unwrap();
    buffer.shutdown();
    buffer.shutdown();
    buffer.request_more();
    drop(buffer);

    let buffer = PrefetchBuffer::new(4, shared_game(4, 0), bounds(), center()).unwrap();
    drop(buffer);
}

#[test]
fn oversized_bounds_count_as_failed_items() {
    let huge = Size::new(1e10, 1e10);
    let buffer = PrefetchBuffer::new(2, shared_game(4, 0), huge, Point::ZERO).unwrap();
    assert!(buffer.wait_idle(WAIT));

    let stats = buffer.stats();
    assert_eq!(stats.produced, 0);
    assert_eq!(stats.failed, 2);
    assert_eq!(buffer.size(), 0);
    assert_eq!(buffer.outstanding(), 0);
}

/// Reports each decode start, then blocks until released.
struct GatedDecoder {
    started: mpsc::Sender<()>,
    release: Mutex<mpsc::Receiver<()>>,
}

impl Decode for GatedDecoder {
    fn decode(&self, location: &Location) -> Result<Raster, DecodeError> {
        let _ = self.started.send(());
        let _ = self
            .release
            .lock()
            .unwrap()
            .recv_timeout(Duration::from_secs(10));
        FsDecoder.decode(location)
    }
}

#[test]
fn decoding_does_not_hold_the_game_lock() {
    let (started_tx, started_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let decoder = Arc::new(GatedDecoder {
        started: started_tx,
        release: Mutex::new(release_rx),
    });

    let game = Arc::new(Mutex::new(game(4, 0).with_decoder(decoder)));
    let buffer = PrefetchBuffer::new(1, Arc::clone(&game), bounds(), center()).unwrap();
    started_rx.recv_timeout(WAIT).unwrap();

    // The worker is parked inside decode; the game must still be free.
    let label = Label::new("left").unwrap();
    let item = LabeledItem::new(Location::path("left/z"), label.clone(), "z").unwrap();
    {
        let mut guard = game.try_lock().expect("game lock held during decode");
        assert_eq!(guard.score_image(&item, &label), 1);
    }

    release_tx.send(()).unwrap();
    assert!(buffer.wait_for_size(1, WAIT));
}
