use bsp_csg::{CsgOperator, CsgOptions};
use csg_viz::{draw_soup, draw_soup_wireframe, OrbitCamera, Scene, TreeNavigator};
use macroquad::prelude::*;

const OPERATOR_KEYS: [KeyCode; 5] = [
    KeyCode::Key1,
    KeyCode::Key2,
    KeyCode::Key3,
    KeyCode::Key4,
    KeyCode::Key5,
];

#[macroquad::main("BSP CSG")]
async fn main() {
    let options = CsgOptions::from_env();
    println!(
        "Tolerances: epsilon {}, cleanup {}",
        options.epsilon, options.cleanup_epsilon
    );

    let mut scene = Scene::new(CsgOperator::Union, options);
    println!(
        "Tree of operand A: {} nodes, {} triangles, depth {}",
        scene.tree().len(),
        scene.tree().triangle_count(),
        scene.tree().depth()
    );

    let mut camera = OrbitCamera::new(18.0, 0.6, 0.4);
    let mut navigator = TreeNavigator::new();
    let mut show_tree = false;

    loop {
        camera.update();
        for (key, operator) in OPERATOR_KEYS.into_iter().zip(CsgOperator::ALL) {
            if is_key_pressed(key) && scene.set_operator(operator) {
                match scene.report() {
                    Ok(report) => println!("{}: {:?}", operator, report),
                    Err(err) => println!("{}: {}", operator, err),
                }
            }
        }
        if is_key_pressed(KeyCode::T) {
            show_tree = !show_tree;
        }
        if show_tree {
            navigator.update(scene.tree());
        }

        clear_background(Color::from_rgba(15, 15, 25, 255));
        set_camera(&camera.to_camera3d());

        if show_tree {
            navigator.render(scene.tree(), camera.eye_point(), scene.epsilon());
        } else {
            draw_soup(scene.result());
            draw_soup_wireframe(scene.result(), Color::from_rgba(0, 0, 0, 120));
        }

        draw_line_3d(vec3(0.0, 0.0, 0.0), vec3(8.0, 0.0, 0.0), RED);
        draw_line_3d(vec3(0.0, 0.0, 0.0), vec3(0.0, 8.0, 0.0), GREEN);
        draw_line_3d(vec3(0.0, 0.0, 0.0), vec3(0.0, 0.0, 8.0), BLUE);

        set_default_camera();

        draw_text(
            &format!(
                "A {} B - {} triangles (operands: {})",
                scene.operator(),
                scene.result().triangle_count(),
                scene.operands().triangle_count()
            ),
            10.0,
            25.0,
            20.0,
            WHITE,
        );
        let status = match scene.report() {
            Ok(report) => format!(
                "split {} | killed {} | inverted {} | coplanar {}",
                report.split_triangles, report.killed, report.inverted, report.coplanar
            ),
            Err(err) => err.to_string(),
        };
        draw_text(&status, 10.0, 45.0, 18.0, GRAY);

        if show_tree {
            navigator.draw_ui(scene.tree(), camera.eye_point(), scene.epsilon(), 70.0);
        }

        draw_text(
            "[1] union [2] subtract [3] subtract-loss [4] and [5] xor | [T]ree view",
            10.0,
            155.0,
            16.0,
            DARKGRAY,
        );
        draw_text("Drag mouse to rotate, scroll to zoom", 10.0, 175.0, 16.0, DARKGRAY);
        draw_text(&format!("FPS: {}", get_fps()), 10.0, 195.0, 16.0, DARKGRAY);

        next_frame().await
    }
}
