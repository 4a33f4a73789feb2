/// The scrolling introduction — story text and word wrapping.
///
/// Terminal cells are monospace, so line width is simply the character
/// count; no font metrics involved.

/// Shown once at startup, scrolling up from the bottom of the screen.
pub const STORY_TEXT: &str = "\
How the game works:
________________________________________

Leo's Quest, hero of the Dys
________________________________________

Press Up/Down to speed up, pause or resume the scrolling text;
read it at your own pace.

Use the arrow keys to move the hero.

You can switch the game in and out of fullscreen at any time
with the 'F' key.

Leo's Quest tells the story of Leo, a brave young boy living
with dyslexia, dyspraxia and dysgraphia.

He discovers a mysterious door that leads him into the World of
the Dys, a parallel universe standing for the challenges children
like him face every day.

There Leo meets obstacles that embody his daily struggles, but
also magic power-ups that grant him the strength to overcome them.

As the adventure goes on the challenges grow harder, but Leo
gains confidence and strength.

At last, after one final difficult battle, he understands that
this world was a metaphor for his own struggles, and that he has
the inner strength to face them.

Back in his room, he knows the obstacles remain, but that he can
take them on, one at a time.

This game wants every Dys player to see each difficulty as a
chance to grow, whatever their age and whatever their troubles.
Telling themselves: if Leo can do it, so can I.
________________________________________

Good adventure with Leo.
________________________________________
";

/// Break `text` into lines at most `max_cols` characters wide, wrapping at
/// word boundaries.  Blank source lines are preserved as blank output
/// lines so paragraph spacing survives.
pub fn wrap_text(text: &str, max_cols: usize) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        if paragraph.trim().is_empty() {
            lines.push(String::new());
            continue;
        }

        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            // A word wider than the field (the story's separator rows,
            // for one) is hard-split into full-width chunks.
            let mut word = word;
            while word.chars().count() > max_cols {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                let split = word
                    .char_indices()
                    .nth(max_cols)
                    .map(|(i, _)| i)
                    .unwrap_or(word.len());
                let (head, tail) = word.split_at(split);
                lines.push(head.to_string());
                word = tail;
            }
            if word.is_empty() {
                continue;
            }

            let candidate_len = if current.is_empty() {
                word.chars().count()
            } else {
                current.chars().count() + 1 + word.chars().count()
            };
            if candidate_len > max_cols && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }

    lines
}
