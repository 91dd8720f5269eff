//! Per-kind rules for expanding an item into slides.

use crate::service::item::ServiceItem;
use crate::slides::slide::Slide;
use crate::types::{BackgroundKind, ItemKind};

/// Number of slides an item expands to.
///
/// Songs get one slide per text entry. Images and videos are always a single
/// slide. Presentations trust the page count they were built with, except html
/// decks which render as one slide. Unknown kinds produce nothing.
pub fn slide_count(item: &ServiceItem) -> usize {
    match &item.kind {
        ItemKind::Song => item.text.len(),
        ItemKind::Image | ItemKind::Video => 1,
        ItemKind::Presentation if item.is_html() => 1,
        ItemKind::Presentation => item.slide_number.max(1),
        ItemKind::Other(_) => 0,
    }
}

/// Expand an item into its slides, in order.
pub fn derive_slides(item: &ServiceItem) -> Vec<Slide> {
    let count = slide_count(item);
    let (image_background, video_background) = backgrounds(item);
    let html = item.is_html();

    (0..count)
        .map(|index| Slide {
            source_item_id: item.id.clone(),
            index,
            slide_count: count,
            kind: item.kind.clone(),
            text: item.text.get(index).cloned().unwrap_or_default(),
            audio: item.audio.clone(),
            image_background: image_background.clone(),
            video_background: video_background.clone(),
            font: item.font.clone(),
            font_size: item.font_size,
            horizontal_alignment: item.horizontal_alignment,
            vertical_alignment: item.vertical_alignment,
            looping: item.looping,
            html,
            reveal_steps: if html { item.reveal_steps.max(1) } else { 1 },
            video_start_time: item.video_start_time,
            video_end_time: item.video_end_time,
        })
        .collect()
}

/// Route the background into the image or video slot.
fn backgrounds(item: &ServiceItem) -> (String, String) {
    let is_video = match &item.kind {
        ItemKind::Video => true,
        ItemKind::Image | ItemKind::Presentation => false,
        ItemKind::Song | ItemKind::Other(_) => item.background_kind == BackgroundKind::Video,
    };
    if is_video {
        (String::new(), item.background.clone())
    } else {
        (item.background.clone(), String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HorizontalAlignment, ItemKind, VerticalAlignment};

    #[test]
    fn test_song_one_slide_per_verse() {
        let song = ServiceItem::song("Song", vec!["v1".into(), "v2".into(), "v3".into()])
            .with_background("/bg/loop.mp4", BackgroundKind::Video);
        let slides = derive_slides(&song);
        assert_eq!(slides.len(), 3);
        assert_eq!(slides[1].text, "v2");
        assert_eq!(slides[1].index, 1);
        assert_eq!(slides[2].slide_count, 3);
        assert_eq!(slides[0].video_background, "/bg/loop.mp4");
        assert!(slides[0].image_background.is_empty());
    }

    #[test]
    fn test_image_and_video_single_slide() {
        let image = ServiceItem::image("Welcome", "/img/welcome.png");
        let slides = derive_slides(&image);
        assert_eq!(slides.len(), 1);
        assert_eq!(slides[0].image_background, "/img/welcome.png");

        let video = ServiceItem::video("Countdown", "/vid/countdown.mp4");
        let slides = derive_slides(&video);
        assert_eq!(slides.len(), 1);
        assert_eq!(slides[0].video_background, "/vid/countdown.mp4");
    }

    #[test]
    fn test_presentation_uses_page_count() {
        let deck = ServiceItem::presentation("Sermon", "/decks/sermon.pdf", 4);
        let slides = derive_slides(&deck);
        assert_eq!(slides.len(), 4);
        assert!(slides.iter().all(|s| s.image_background == "/decks/sermon.pdf"));
        assert_eq!(slides.iter().map(|s| s.index).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_html_deck_is_one_slide_with_reveal_steps() {
        let deck = ServiceItem::presentation("Reveal", "/decks/talk.html", 5);
        let slides = derive_slides(&deck);
        assert_eq!(slides.len(), 1);
        assert!(slides[0].html);
        assert_eq!(slides[0].reveal_steps, 5);

        let pdf = derive_slides(&ServiceItem::presentation("Pdf", "/decks/talk.pdf", 2));
        assert!(!pdf[0].html);
        assert_eq!(pdf[0].reveal_steps, 1);
    }

    #[test]
    fn test_alignment_carried_to_slides() {
        let song = ServiceItem::song("Song", vec!["v1".into(), "v2".into()])
            .with_alignment(HorizontalAlignment::Right, VerticalAlignment::Top);
        let slides = derive_slides(&song);
        assert!(slides.iter().all(|s| s.horizontal_alignment == HorizontalAlignment::Right));
        assert!(slides.iter().all(|s| s.vertical_alignment == VerticalAlignment::Top));
    }

    #[test]
    fn test_unknown_kind_has_no_slides() {
        let item = ServiceItem::new("Web", ItemKind::Other("web".into()));
        assert_eq!(slide_count(&item), 0);
        assert!(derive_slides(&item).is_empty());
    }

    #[test]
    fn test_empty_song_has_no_slides() {
        let song = ServiceItem::song("Empty", Vec::new());
        assert_eq!(song.slide_number, 0);
        assert!(derive_slides(&song).is_empty());
    }
}
