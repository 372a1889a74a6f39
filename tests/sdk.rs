//! End-to-end suite over a synthesized client directory.

mod common;

use std::path::Path;
use std::sync::OnceLock;
use tempfile::TempDir;
use uosdk::geo::map::MapRectCells;
use uosdk::{UoError, UoFiles};

fn client_dir() -> &'static Path {
    static DIR: OnceLock<TempDir> = OnceLock::new();
    DIR.get_or_init(|| {
        let dir = tempfile::tempdir().unwrap();
        common::build_client_dir(dir.path());
        dir
    })
    .path()
}

fn sdk() -> UoFiles {
    UoFiles::open(client_dir()).unwrap()
}

#[test]
fn missing_directory_is_an_io_error() {
    assert!(matches!(
        UoFiles::open("/definitely/not/a/client"),
        Err(UoError::Io { .. })
    ));
}

#[test]
fn land_tile_zero_decodes_with_name() {
    let sdk = sdk();
    let tile = sdk.land_art(0).unwrap();
    let image = tile.image();
    assert_eq!((image.width(), image.height()), (44, 44));
    assert!(image.at(22, 0).is_opaque());
    assert_eq!(tile.name(), common::LAND_NAME);
}

#[test]
fn land_ids_stop_at_the_family_ceiling() {
    let sdk = sdk();
    assert!(matches!(
        sdk.land_art(0x4000),
        Err(UoError::OutOfRange { .. })
    ));
    // Present in range but an index hole: NotFound.
    assert!(matches!(sdk.land_art(17), Err(UoError::NotFound { .. })));
}

#[test]
fn static_tile_decodes_with_transparency() {
    let sdk = sdk();
    let tile = sdk.static_art(common::STATIC_ID).unwrap();
    let image = tile.image();
    assert!(image.width() > 0 && image.height() > 0);
    assert_eq!(tile.name(), common::STATIC_NAME);
    // Skipped pixels stay zero and convert to transparent.
    assert_eq!(image.at(0, 0).value(), 0);
    assert_eq!(image.to_image().get_pixel(0, 0).0[3], 0);
    assert!(image.at(2, 0).value() != 0);
}

#[test]
fn gump_dimensions_come_from_the_extra_word() {
    let sdk = sdk();
    let gump = sdk.gump(5).unwrap();
    assert_eq!((gump.image().width(), gump.image().height()), (10, 4));
    assert_eq!(gump.image().at(9, 3).value(), 0x801F);
    assert!(matches!(sdk.gump(4), Err(UoError::NotFound { .. })));
    assert!(matches!(
        sdk.gump(0x10000),
        Err(UoError::OutOfRange { .. })
    ));
}

#[test]
fn gump_iteration_skips_holes_and_repeats_identically() {
    let sdk = sdk();
    let gumps = sdk.gumps().unwrap();
    let first: Vec<u32> = gumps.iter().map(|g| g.id()).collect();
    let second: Vec<u32> = gumps.iter().map(|g| g.id()).collect();
    assert_eq!(first, vec![5]);
    assert_eq!(first, second);
}

#[test]
fn hue_1337_matches_the_fixture() {
    let sdk = sdk();
    let hue = sdk.hue(1337).unwrap();
    assert_eq!(hue.index(), 1337);
    assert_eq!(hue.name(), "royal");
    assert!(hue.colors().iter().all(|&c| c <= 0x7FFF));
    assert!(hue.color(0).is_opaque());
}

#[test]
fn hue_boundaries() {
    let sdk = sdk();
    assert!(sdk.hue(0).is_ok());
    assert!(sdk.hue(2999).is_ok());
    assert!(matches!(sdk.hue(3000), Err(UoError::OutOfRange { .. })));
}

#[test]
fn map_tile_lookup_matches_the_worked_example() {
    let sdk = sdk();
    let map = sdk.tile_map(common::MAP_INDEX).unwrap();
    assert_eq!(map.width(), common::MAP_SIDE);
    assert_eq!(map.height(), common::MAP_SIDE);

    let tile = map
        .tile_at(common::TILE_X as i64, common::TILE_Y as i64)
        .unwrap();
    assert_eq!(tile.land_id(), common::TILE_LAND_ID);
    assert_eq!(tile.z(), 0);
    let mut ids: Vec<u16> = tile.statics().iter().map(|s| s.id()).collect();
    ids.sort_unstable();
    let mut expected = common::TILE_STATICS.to_vec();
    expected.sort_unstable();
    assert_eq!(ids, expected);
    // Annotations came through tiledata.
    assert!(tile.statics().iter().all(|s| !s.name().is_empty()));

    // A boring tile decodes too.
    let tile = map.tile_at(0, 0).unwrap();
    assert_eq!(tile.land_id(), 0);
    assert!(tile.statics().is_empty());
}

#[test]
fn map_coordinates_are_bounded() {
    let sdk = sdk();
    let map = sdk.tile_map(common::MAP_INDEX).unwrap();
    assert!(matches!(
        map.tile_at(-1, -1),
        Err(UoError::OutOfRange { .. })
    ));
    assert!(matches!(
        map.tile_at(common::MAP_SIDE as i64, common::MAP_SIDE as i64),
        Err(UoError::OutOfRange { .. })
    ));
}

#[test]
fn map_handles_are_cached_per_index() {
    let sdk = sdk();
    let a = sdk.tile_map(common::MAP_INDEX).unwrap();
    let b = sdk.tile_map(common::MAP_INDEX).unwrap();
    assert!(std::sync::Arc::ptr_eq(&a, &b));
}

#[test]
fn radar_image_covers_the_requested_rect() {
    let sdk = sdk();
    let map = sdk.tile_map(common::MAP_INDEX).unwrap();
    let rect = MapRectCells {
        x0: common::TILE_X - 4,
        y0: common::TILE_Y - 4,
        width: 16,
        height: 16,
    };
    let image = map.radar_image(rect).unwrap();
    assert_eq!((image.width(), image.height()), (16, 16));
    // The worked tile shows its topmost static's radar color.
    let expected = 0x4000 + common::TILE_STATICS.iter().max().unwrap();
    let pixel = image.at(common::TILE_X as i32, common::TILE_Y as i32);
    assert_eq!(pixel.value() & 0x7FFF, expected & 0x7FFF);
    assert!(pixel.is_opaque());
}

#[test]
fn cliloc_strings_resolve_by_id() {
    let sdk = sdk();
    let cliloc = sdk.cliloc().unwrap();
    assert_eq!(cliloc.language(), "enu");
    assert_eq!(cliloc.string(1_000_000).unwrap(), "You see nothing special.");
    assert_eq!(cliloc.string(3).unwrap(), "gold");
    assert!(matches!(
        cliloc.string(42),
        Err(UoError::NotFound { .. })
    ));
    let ids: Vec<u32> = cliloc.iter().map(|(id, _)| id).collect();
    assert_eq!(ids, vec![3, 1_000_000]);
}

#[test]
fn animation_decodes_at_least_one_frame() {
    let sdk = sdk();
    let animation = sdk.animation(1, 0, 0).unwrap();
    assert!(!animation.frames().is_empty());
    let frame = &animation.frames()[0];
    assert!(frame.image().width() > 0 && frame.image().height() > 0);
    // The animdata table rode along.
    let data = animation.data().unwrap();
    assert_eq!(data.frame_count(), 4);
    assert_eq!(data.frames(), &[0, 1, 2, 3]);
}

#[test]
fn animation_direction_is_bounded() {
    let sdk = sdk();
    assert!(matches!(
        sdk.animation(1, 0, 8),
        Err(UoError::OutOfRange { .. })
    ));
}

#[test]
fn speech_entries_keep_stream_order() {
    let sdk = sdk();
    let speech = sdk.speech().unwrap();
    let entries: Vec<(u16, String)> = speech
        .iter()
        .map(|e| (e.id(), e.text().clone()))
        .collect();
    assert_eq!(
        entries,
        vec![
            (5, "vendor buy".to_owned()),
            (5, "vendor sell".to_owned()),
            (12, "guards".to_owned()),
        ]
    );
}

#[test]
fn skills_and_groups() {
    let sdk = sdk();
    let skills = sdk.skills().unwrap();
    let all: Vec<_> = skills.iter().collect();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].name(), "Alchemy");
    assert!(all[0].is_action());
    assert_eq!(all[2].name(), "Animal Lore");
    assert!(!all[2].is_action());

    let groups = sdk.skill_groups().unwrap();
    assert_eq!(groups.names()[0], "Misc");
    assert_eq!(groups.group_of(0), Some("Combat"));
    assert_eq!(groups.group_of(2), Some("Magic"));
}

#[test]
fn lights_decode_from_the_extra_word() {
    let sdk = sdk();
    let light = sdk.lights().unwrap().light(0).unwrap();
    assert_eq!((light.width(), light.height()), (4, 4));
    assert_eq!(light.intensity(1, 0), 1);
    assert!(light.image().opaque());
}

#[test]
fn textures_follow_their_size_class() {
    let sdk = sdk();
    let textures = sdk.land_textures().unwrap();
    assert_eq!(textures.texture(0).unwrap().image().width(), 64);
    assert_eq!(textures.texture(1).unwrap().image().width(), 128);
    assert!(matches!(
        textures.texture(0x4000),
        Err(UoError::OutOfRange { .. })
    ));
}

#[test]
fn sounds_carry_names_and_wav_framing() {
    let sdk = sdk();
    let sound = sdk.sounds().unwrap().sound(0).unwrap();
    assert_eq!(sound.name(), "bell.wav");
    assert_eq!(sound.pcm().len(), 8);
    let wav = sound.wav();
    assert_eq!(&wav[..4], b"RIFF");
    assert_eq!(wav.len(), 44 + 8);
}

#[test]
fn multis_list_items_and_composite() {
    let sdk = sdk();
    let multi = sdk.multis().unwrap().multi(0).unwrap();
    assert_eq!(multi.items().len(), 2);
    assert_eq!(multi.items()[0].id(), common::STATIC_ID as u16);

    let image = sdk.multi_image(0).unwrap();
    assert!(image.width() > 0 && image.height() > 0);
}

#[test]
fn fonts_parse_both_families() {
    let sdk = sdk();
    let fonts = sdk.ascii_fonts().unwrap();
    assert_eq!(fonts.len(), 10);
    let glyph = fonts[3].glyph(b'A').unwrap();
    assert_eq!((glyph.width(), glyph.height()), (4, 6));
    assert!(glyph.image().opaque());
    assert!(fonts[0].glyph(0x10).is_none());

    let unifont = sdk.unicode_font(0).unwrap();
    let glyph = unifont.glyph('A').unwrap();
    assert_eq!(glyph.x_offset(), 1);
    assert_eq!(glyph.y_offset(), -2);
    assert_eq!((glyph.image().width(), glyph.image().height()), (8, 2));
    assert!(glyph.image().at(0, 0).is_opaque());
    assert_eq!(glyph.image().at(0, 1).value(), 0);
    assert!(matches!(
        unifont.glyph('B'),
        Err(UoError::NotFound { .. })
    ));
}

#[test]
fn radar_colors_split_land_and_static() {
    let sdk = sdk();
    let radar = sdk.radar_colors().unwrap();
    assert_eq!(radar.land(5).unwrap().color(), 5);
    assert_eq!(
        radar.static_item(5).unwrap().color(),
        (0x4000 + 5) & 0x7FFF
    );
    assert!(matches!(
        radar.land(0x4000),
        Err(UoError::OutOfRange { .. })
    ));
}

#[test]
fn tiledata_info_is_directly_reachable() {
    let sdk = sdk();
    let land = sdk.land_tile_info(0).unwrap();
    assert_eq!(land.name(), common::LAND_NAME);
    let item = sdk.static_tile_info(common::STATIC_ID).unwrap();
    assert_eq!(item.name(), common::STATIC_NAME);
    assert!(item.flags().impassable());
}

#[test]
fn close_is_idempotent_and_final() {
    let sdk = UoFiles::open(client_dir()).unwrap();
    assert!(sdk.hue(1).is_ok());
    sdk.close();
    sdk.close();
    assert!(matches!(sdk.hue(1), Err(UoError::Closed)));
    assert!(matches!(sdk.gump(5), Err(UoError::Closed)));
}

#[test]
fn concurrent_readers_share_one_instance() {
    let sdk = std::sync::Arc::new(sdk());
    let mut handles = Vec::new();
    for _ in 0..4 {
        let sdk = sdk.clone();
        handles.push(std::thread::spawn(move || {
            for _ in 0..8 {
                let hue = sdk.hue(1337).unwrap();
                assert_eq!(hue.name(), "royal");
                let tile = sdk.land_art(0).unwrap();
                assert_eq!(tile.image().width(), 44);
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }
}
