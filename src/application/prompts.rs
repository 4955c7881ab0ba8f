//! 图像提示词模板
//!
//! 提示词在受理请求时即构建完毕并存入工件槽位，重试时原样重放。

/// 封面图提示词
pub fn cover_prompt(title: &str, style: &str) -> String {
    format!(
        "Book cover art for \"{}\", {} style, masterpiece, best quality, elegant, captivating, \
         room for title text (but no actual text), high quality illustration, 16:9 aspect ratio.",
        title, style
    )
}

/// 场景图提示词（引用角色上下文保持形象一致）
pub fn scene_prompt(scene_description: &str, character_context: &str, style: &str) -> String {
    format!(
        "Cinematic illustration of a key scene: {}, Context: {} {} style, masterpiece, \
         best quality, highly detailed, dramatic composition, visual storytelling, \
         8k resolution, 16:9 aspect ratio, no text, no watermark.",
        scene_description, character_context, style
    )
}

/// 角色头像提示词（构图适配圆形裁切）
pub fn portrait_prompt(name: &str, role: &str, style: &str) -> String {
    format!(
        "Close-up portrait of {} as {}, centered character, facing the viewer, {} style, \
         masterpiece, best quality, expressive, highly detailed, soft diffused lighting, \
         clean plain white background, no text, no logo, no watermark, \
         framed to work well as a circular avatar.",
        name, role, style
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts_embed_inputs() {
        let p = cover_prompt("Moby Dick", "storybook");
        assert!(p.contains("Moby Dick"));
        assert!(p.contains("storybook"));

        let p = scene_prompt("a whale breaches", "Ahab (one-legged)", "manga");
        assert!(p.contains("a whale breaches"));
        assert!(p.contains("Ahab"));

        let p = portrait_prompt("Ahab", "captain", "storybook");
        assert!(p.contains("Ahab as captain"));
    }
}
