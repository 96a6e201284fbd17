//! End-to-end flow: build a project in the editor, save it, preview it,
//! then walk through it as a visitor.

use image::{DynamicImage, ImageFormat, RgbImage};
use pano_tour::config::ViewerSettings;
use pano_tour::scene::ViewerEvent;
use pano_tour::state::edit::HotspotPatch;
use pano_tour::state::hotspots::DeletePolicy;
use pano_tour::state::progress::{SessionToken, UnlockTracker};
use pano_tour::tour::NavStatus;
use pano_tour::{HotspotKind, Notice, Persistence, ProjectEditor, ProjectLibrary, TourSession};
use std::io::Cursor;

fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, image::Rgb([10, 90, 160])))
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)
        .unwrap();
    bytes
}

#[tokio::test]
async fn test_build_preview_and_visit() {
    let mut library =
        ProjectLibrary::open(Persistence::in_memory(1 << 22).unwrap(), ViewerSettings::default());
    let mut editor = ProjectEditor::default();

    editor.upload_root_image(jpeg(64, 32)).await.unwrap();
    let lobby = editor.add_hotspot(0.0, 45.0).unwrap();
    let garden = editor.add_hotspot(-5.0, 200.0).unwrap();
    let unused = editor.add_hotspot(0.0, 0.0).unwrap();
    assert!(editor.upload_hotspot_image(&lobby, jpeg(64, 32)).await.unwrap());
    assert!(editor.upload_hotspot_image(&garden, jpeg(64, 32)).await.unwrap());
    editor.change_type(&garden, HotspotKind::Door);
    editor.update_hotspot(&lobby, &HotspotPatch::new().text("Lobby"));
    assert_eq!(editor.remove_hotspot(&unused, DeletePolicy::Orphan), 1);

    editor.enter(&lobby).unwrap();
    let desk = editor.add_hotspot(0.0, 90.0).unwrap();
    editor.update_hotspot(&desk, &HotspotPatch::new().target_image("desk.jpg"));
    editor.back();

    let notice = editor.submit(&mut library, "office", "Office").unwrap();
    assert_eq!(notice, Notice::success("Project created!"));

    let preview = library.preview_project("office").unwrap();
    assert_eq!(preview.scenes.len(), 4);
    let json = preview.to_json().unwrap();
    assert!(json.contains("\"firstScene\":\"main\""));
    assert!(json.contains("hotspot-door"));

    let session = SessionToken::generate();
    let mut tracker = UnlockTracker::new();
    let (mut tour, _config) = TourSession::open(&library, "office", session).unwrap();

    let lobby_scene = format!("scene_{lobby}");
    let garden_scene = format!("scene_{garden}");
    let desk_scene = format!("scene_{desk}");

    assert!(tour.go_to(&garden_scene, &mut tracker).is_err());
    tour.go_to(&lobby_scene, &mut tracker).unwrap();
    tour.handle_event(&ViewerEvent::SceneChange(desk_scene.clone()), &mut tracker);
    assert_eq!(tour.current_scene(), desk_scene);

    let menu = tour.navigation(&tracker);
    let statuses: Vec<_> = menu.iter().map(|e| (e.scene_id.as_str(), e.status)).collect();
    assert_eq!(
        statuses,
        vec![
            ("main", NavStatus::Open),
            (lobby_scene.as_str(), NavStatus::Unlocked),
            (garden_scene.as_str(), NavStatus::NextAvailable),
        ]
    );
    assert_eq!(menu[1].label, "Lobby");

    assert_eq!(tour.go_back(), Some(lobby_scene.as_str()));
    assert_eq!(tour.go_back(), Some("main"));

    // deleting the project makes it unreachable for new visitors
    library.delete("office").unwrap();
    assert!(TourSession::open(&library, "office", SessionToken::generate()).is_err());
}
